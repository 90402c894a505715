use anyhow::Result;
use openflights_subset::{
    cli::{Cli, Commands, SubsetArgs},
    download::ensure_data_downloaded,
    pipeline::{run_subset, Summary},
    schema::{DependencyResolver, ALL_TABLES},
    ui::ConsoleUi,
};
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openflights_subset=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse_args();
    let mut ui = ConsoleUi::new();

    match cli.command {
        Commands::Subset(args) => {
            subset(&args, None, &mut ui)?;
        }

        Commands::Sync {
            subset: args,
            force,
            cache_dir,
        } => {
            let data_dir = ensure_data_downloaded(cache_dir, force, &mut ui)?;
            subset(&args, Some(&data_dir), &mut ui)?;
        }

        Commands::Download { output, force } => {
            let path = ensure_data_downloaded(output, force, &mut ui)?;
            println!("OpenFlights data available in {:?}", path);
        }

        Commands::Tables => {
            let resolver = DependencyResolver::new();
            println!("Available tables:\n");
            for table in ALL_TABLES {
                let optional = if table.required { "" } else { " (optional)" };
                println!("  {}{} <- {}", table.name, optional, table.source_file);
                for fk in table.foreign_keys {
                    println!(
                        "      {} -> {}({}) [{}]",
                        fk.column,
                        fk.references_table,
                        fk.references_columns.join(" | "),
                        fk.kind
                    );
                }
                let dependents = resolver.dependents(table.name);
                if !dependents.is_empty() {
                    println!("      referenced by: {}", dependents.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn subset(args: &SubsetArgs, data_dir: Option<&Path>, ui: &mut ConsoleUi) -> Result<Summary> {
    let start = Instant::now();
    let config = args.to_config(data_dir);

    let summary = run_subset(&config, ui)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\nFinal subset sizes:");
        for table in &summary.tables {
            if let (Some(rows), Some(path)) = (table.output_rows, &table.output_path) {
                println!("  {:10} {:>6}  -> {:?}", table.name, rows, path);
            }
        }
        println!(
            "\nSampled {} routes (seed {}) in {} passes, {:.2}s",
            summary.sampled_routes,
            summary.seed,
            summary.passes,
            start.elapsed().as_secs_f64()
        );
    }

    Ok(summary)
}
