//! One module per `migrate` subcommand, each exposing a single
//! `async fn run(&Args) -> anyhow::Result<Outcome>` that [`crate::main`]
//! dispatches to.

pub mod down;
pub mod drop_cmd;
pub mod generate;
pub mod reset;
pub mod status;
pub mod up;
