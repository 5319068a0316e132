//! Features commands: list, set, reset

use super::FeaturesAction;
use crate::features::{DebugFeatures, FeatureError, FeatureItem};

/// Handle `features <action>`
pub fn handle(action: FeaturesAction, features: &DebugFeatures) -> Result<(), FeatureError> {
    match action {
        FeaturesAction::List => {
            for item in features.feature_items()? {
                println!("{}", render(&item));
            }
        }
        FeaturesAction::Set { key, option } => {
            features.override_by_key(&key, Some(&option))?;
            println!("✅ {} set to {}", key, option.to_lowercase());
        }
        FeaturesAction::Reset { key } => {
            features.override_by_key(&key, None)?;
            println!("✅ {} reset to default", key);
        }
    }
    Ok(())
}

/// `Label (key): selection [options] default: x`
fn render(item: &FeatureItem) -> String {
    let selection = item.selection.unwrap_or("-");
    format!(
        "{} ({}): {} [{}] default: {}",
        item.label,
        item.key,
        selection,
        item.options.join("|"),
        item.default
    )
}
