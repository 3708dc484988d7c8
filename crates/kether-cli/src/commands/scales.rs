//! Scale listing command.

use clap::Args;
use kether_synth::{BASE_FREQUENCY, Scale, ScaleSystem};

/// List scales, or the note frequencies of one scale.
#[derive(Args)]
pub struct ScalesArgs {
    /// Scale to show in detail (id or display name)
    #[arg(value_name = "SCALE")]
    scale: Option<String>,

    /// Lowest note to print
    #[arg(long, default_value = "0")]
    from: u8,

    /// Number of notes to print
    #[arg(long, default_value = "13")]
    count: u8,

    /// Tonic frequency of note 0 in Hz
    #[arg(long, default_value_t = BASE_FREQUENCY)]
    base: f32,
}

fn find_scale(name: &str) -> Option<Scale> {
    let wanted = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    Scale::ALL
        .iter()
        .copied()
        .find(|s| s.id() == wanted || s.name().eq_ignore_ascii_case(name.trim()))
}

fn format_ratios(scale: Scale) -> String {
    scale
        .ratios()
        .iter()
        .map(|r| format!("{r:.4}"))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Run the scales command.
pub fn run(args: ScalesArgs) -> anyhow::Result<()> {
    let Some(name) = &args.scale else {
        println!("{:3}  {:20}  {:20}  Ratios", "#", "Name", "Id");
        println!("{:3}  {:20}  {:20}  ------", "-", "----", "--");
        for scale in Scale::ALL {
            println!(
                "{:3}  {:20}  {:20}  {}",
                scale.index(),
                scale.name(),
                scale.id(),
                format_ratios(scale)
            );
        }
        return Ok(());
    };

    let scale = find_scale(name).ok_or_else(|| anyhow::anyhow!("Unknown scale: {}", name))?;
    let mut system = ScaleSystem::new();
    system.set_scale(scale);

    println!("{}", scale.name());
    println!("{}", "=".repeat(scale.name().len()));
    println!();
    println!("Ratios: {}", format_ratios(scale));
    println!();
    println!("{:>4}  {:>6}  {:>12}", "Note", "Index", "Frequency");

    let last = args.from.saturating_add(args.count.saturating_sub(1)).min(127);
    for note in args.from..=last {
        println!(
            "{:>4}  {:>6}  {:>9.2} Hz",
            note,
            ScaleSystem::scale_index(note),
            system.frequency_for_note(note, args.base)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_scale() {
        assert_eq!(find_scale("celtic"), Some(Scale::Celtic));
        assert_eq!(find_scale("Native American"), Some(Scale::NativeAmerican));
        assert_eq!(find_scale("nordic-aurora"), Some(Scale::NordicAurora));
        assert_eq!(find_scale("lydian"), None);
    }

    #[test]
    fn test_format_ratios_starts_at_unison() {
        assert!(format_ratios(Scale::JapaneseYo).starts_with("1.0000"));
    }
}
