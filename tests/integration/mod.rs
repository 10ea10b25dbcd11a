mod cli_contracts;
mod dispatch;
mod loader;
mod sandbox;
mod support;
