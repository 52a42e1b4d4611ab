// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands them to a use case and prints
// the result. All model work happens in Layer 2 and below.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, InitArgs, InspectArgs, ReferenceArgs};

use crate::application::{AppBackend, InferBackend};

#[derive(Parser, Debug)]
#[command(
    name = "value-head-lm",
    version = "0.1.0",
    about = "Causal language models with a scalar value head, and frozen reference copies."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let device = Default::default();
        match self.command {
            Commands::Init(args)      => run_init(args, &device),
            Commands::Inspect(args)   => run_inspect(args, &device),
            Commands::Generate(args)  => run_generate(args, &device),
            Commands::Reference(args) => run_reference(args, &device),
        }
    }
}

type Device = <AppBackend as burn::tensor::backend::Backend>::Device;

fn run_init(args: InitArgs, device: &Device) -> Result<()> {
    use crate::application::init_use_case::InitUseCase;

    let report = InitUseCase::new(args.into()).execute::<AppBackend>(device)?;
    println!(
        "Saved value-head model to '{}' ({} parameters, summary dropout {})",
        report.output, report.num_parameters, report.dropout_prob
    );
    Ok(())
}

fn run_inspect(args: InspectArgs, device: &Device) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let rows = InspectUseCase::new(args.model, args.filter).execute::<AppBackend>(device)?;
    for row in &rows {
        let marker = if row.requires_grad { "" } else { "  (frozen)" };
        println!("{:<64} {:?}{}", row.name, row.shape, marker);
    }
    println!("{} parameters listed", rows.len());
    Ok(())
}

fn run_generate(args: GenerateArgs, device: &Device) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let report = GenerateUseCase::new(args.into()).execute::<InferBackend>(device)?;
    println!("Tokens:    {:?}", report.tokens);
    println!("Generated: {:?}", report.generated());
    let values: Vec<String> = report.values.iter().map(|v| format!("{v:.4}")).collect();
    println!("Values:    [{}]", values.join(", "));
    Ok(())
}

fn run_reference(args: ReferenceArgs, device: &Device) -> Result<()> {
    use crate::application::reference_use_case::ReferenceUseCase;

    let output = args.output.clone();
    let report = ReferenceUseCase::new(args.into()).execute::<AppBackend>(device)?;
    match (report.total_layers, &report.pattern) {
        (Some(total), Some(pattern)) => println!(
            "Reference shares {}/{} layers ({} parameters) via '{}'",
            report.shared_layers, total, report.shared_parameters.len(), pattern
        ),
        _ => println!("Reference is an independent copy"),
    }
    println!("Reference frozen: {}", report.reference_frozen);
    println!("Trainable parameters left in the policy: {}", report.trainable_in_model);
    if let Some(output) = output {
        println!("Saved reference model to '{output}'");
    }
    Ok(())
}
