//! Parameter listing command.

#![allow(clippy::print_literal)]

use clap::Args;
use kether_config::choice_names;
use kether_synth::{ParamUnit, SynthParam};

/// List engine parameters.
#[derive(Args)]
pub struct ParamsArgs {
    /// Show only this parameter (string id)
    #[arg(value_name = "PARAM")]
    param: Option<String>,
}

fn format_range(param: SynthParam) -> String {
    let spec = param.spec();
    if let Some(choices) = choice_names(param) {
        return choices.join(" | ");
    }
    match spec.unit {
        ParamUnit::Toggle => "on | off".to_string(),
        ParamUnit::Count => format!("{:.0} - {:.0}", spec.min, spec.max),
        unit => format!("{} - {}{}", spec.min, spec.max, unit.suffix()),
    }
}

fn format_default(param: SynthParam) -> String {
    let spec = param.spec();
    if let Some(name) = choice_names(param).and_then(|c| c.get(spec.default as usize).copied()) {
        return name.to_string();
    }
    match spec.unit {
        ParamUnit::Toggle => if spec.default >= 0.5 { "on" } else { "off" }.to_string(),
        unit => format!("{}{}", spec.default, unit.suffix()),
    }
}

/// Run the params command.
pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let params: Vec<SynthParam> = match &args.param {
        Some(id) => vec![
            SynthParam::from_id(id).ok_or_else(|| anyhow::anyhow!("Unknown parameter: {}", id))?,
        ],
        None => SynthParam::ALL.to_vec(),
    };

    println!("  {:18}  {:18}  {:12}  {}", "Id", "Name", "Default", "Range");
    println!("  {:18}  {:18}  {:12}  {}", "--", "----", "-------", "-----");
    for param in params {
        println!(
            "  {:18}  {:18}  {:12}  {}",
            param.id(),
            param.spec().name,
            format_default(param),
            format_range(param)
        );
    }

    Ok(())
}
