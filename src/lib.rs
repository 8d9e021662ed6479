#![forbid(unsafe_code)]

pub mod batch;
pub mod cli;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod generate;
pub mod inspect;
pub mod logging;
pub mod openai;
pub mod pairing;
pub mod registry;
pub mod run;
pub mod session;
pub mod site;
pub mod template;
pub mod throttle;
