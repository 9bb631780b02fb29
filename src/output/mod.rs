// Terminal reporting for pipeline stages.

pub mod terminal;
