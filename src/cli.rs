mod args;

pub use args::Cli;
