use breathwork_core::breath::palette::GRADIENTS;
use breathwork_core::breath::{preset, PRESETS};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum PatternAction {
    /// List built-in presets
    List,
    /// Show one preset with its cycle length
    Show {
        /// Preset slug
        slug: String,
    },
    /// List the fill gradients in palette order
    Palette,
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PatternAction::List => {
            let json = serde_json::to_string_pretty(&PRESETS)?;
            println!("{json}");
        }
        PatternAction::Show { slug } => {
            let preset = preset(&slug)?;
            let json = json!({
                "preset": preset,
                "cycle_ms": preset.pattern.cycle_ms(),
                "phases": preset.pattern.active_phases(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        PatternAction::Palette => {
            let gradients: Vec<_> = GRADIENTS
                .iter()
                .enumerate()
                .map(|(index, g)| {
                    json!({
                        "index": index,
                        "name": g.name,
                        "css": g.css(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&gradients)?);
        }
    }
    Ok(())
}
