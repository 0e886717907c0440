//! Ask command - driver assistant.

use anyhow::Result;
use clap::Args;
use haulguard_services::{AiAssistant, AssistantContext};
use haulguard_store::Config;
use std::sync::Arc;

use super::emit;
use crate::app::build_hybrid;
use crate::{Cli, ExitCode};

/// Arguments for the ask command.
#[derive(Args)]
pub struct AskArgs {
    /// The question.
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Driving minutes left before an HOS limit.
    #[arg(long)]
    pub hos_remaining: Option<i64>,

    /// Where the truck is.
    #[arg(long)]
    pub location: Option<String>,

    /// Load description.
    #[arg(long)]
    pub load: Option<String>,

    /// Active trouble codes, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub codes: Vec<String>,
}

impl AskArgs {
    fn context(&self) -> AssistantContext {
        AssistantContext {
            hos_remaining_driving_min: self.hos_remaining,
            location: self.location.clone(),
            load: self.load.clone(),
            active_codes: self.codes.clone(),
        }
    }
}

/// Runs the ask command.
pub async fn run(args: &AskArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let hybrid = build_hybrid(config).await;
    let assistant = AiAssistant::new(Arc::clone(&hybrid));

    let question = args.question.join(" ");
    let reply = assistant.ask(&question, &args.context()).await;

    emit(cli, &reply, |f| f.format_chat(&reply))?;
    Ok(ExitCode::Success)
}
