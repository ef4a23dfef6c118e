//! Program command handlers.

use hcbridge_api::models::{Program, ProgramDefinition};
use hcbridge_core::{Bridge, Command as CoreCommand};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat, ProgramsArgs, ProgramsCommand};
use crate::error::CliError;
use crate::output;

use super::status::render_key_values;
use super::util;

#[derive(Tabled)]
struct ProgramRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Execution")]
    execution: String,
}

fn to_row(def: &ProgramDefinition, color: bool) -> ProgramRow {
    ProgramRow {
        key: output::paint_key(&def.key, color),
        name: def.name.clone().unwrap_or_default(),
        execution: def
            .constraints
            .as_ref()
            .and_then(|c| c.execution.clone())
            .unwrap_or_else(|| "-".into()),
    }
}

fn render_program(program: Option<Program>, label: &str, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let Some(program) = program else {
        if !global.quiet {
            eprintln!("No {label} program");
        }
        return;
    };

    let out = match global.output {
        OutputFormat::Table => {
            let header = format!("{}  {}", output::paint_dim(label, color), program.key);
            if program.options.is_empty() {
                header
            } else {
                format!(
                    "{header}\n{}",
                    render_key_values(&global.output, &program.options, color)
                )
            }
        }
        _ => output::render_single(&global.output, &program, |p| p.key.clone(), |p| p.key.clone()),
    };
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    bridge: &Bridge,
    args: ProgramsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = bridge.client();

    match args.command {
        ProgramsCommand::Available(arg) => {
            let color = output::should_color(&global.color);
            let programs = client
                .available_programs(util::ha_id(&arg.ha_id).as_str())
                .await?;
            let out = output::render_list(
                &global.output,
                &programs,
                |def| to_row(def, color),
                |def| def.key.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProgramsCommand::Active(arg) => {
            let program = client
                .active_program(util::ha_id(&arg.ha_id).as_str())
                .await?;
            render_program(program, "active", global);
            Ok(())
        }

        ProgramsCommand::Selected(arg) => {
            let program = client
                .selected_program(util::ha_id(&arg.ha_id).as_str())
                .await?;
            render_program(program, "selected", global);
            Ok(())
        }

        ProgramsCommand::Select { ha_id, program } => {
            bridge
                .execute(CoreCommand::SelectProgram {
                    ha_id: util::ha_id(&ha_id),
                    program,
                })
                .await?;
            if !global.quiet {
                eprintln!("Program selected");
            }
            Ok(())
        }
    }
}
