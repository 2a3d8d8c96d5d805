//! Interactive asset/network picker

use anyhow::Result;
use dialoguer::Select;

use crate::sweep::AssetClass;

const EXIT: &str = "Exit";
const BACK: &str = "Back";

/// What the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Sweep {
        asset_class: AssetClass,
        network: String,
    },
    Exit,
}

/// Menu entries for the asset question, in display order
pub fn asset_items() -> Vec<String> {
    AssetClass::ALL
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(EXIT.to_string()))
        .collect()
}

/// Menu entries for the network question, in display order
pub fn network_items(networks: &[String]) -> Vec<String> {
    networks
        .iter()
        .cloned()
        .chain(std::iter::once(BACK.to_string()))
        .collect()
}

/// Map an asset menu index; `None` means Exit
pub fn asset_at(index: usize) -> Option<AssetClass> {
    AssetClass::ALL.get(index).copied()
}

/// Map a network menu index; `None` means Back
pub fn network_at(networks: &[String], index: usize) -> Option<String> {
    networks.get(index).cloned()
}

/// Ask for whatever was not given on the command line
///
/// Choosing Back on the network question returns to the asset question.
pub fn prompt(
    asset_class: Option<AssetClass>,
    network: Option<String>,
    networks: &[String],
) -> Result<MenuChoice> {
    let mut preset_asset = asset_class;

    loop {
        let asset_class = match preset_asset.take() {
            Some(class) => class,
            None => {
                let index = Select::new()
                    .with_prompt("Choose the asset type to sweep")
                    .items(&asset_items())
                    .default(0)
                    .interact()?;

                match asset_at(index) {
                    Some(class) => class,
                    None => return Ok(MenuChoice::Exit),
                }
            }
        };

        if let Some(network) = network.clone() {
            return Ok(MenuChoice::Sweep {
                asset_class,
                network,
            });
        }

        let index = Select::new()
            .with_prompt(format!("Choose the EVM network to sweep {}", asset_class))
            .items(&network_items(networks))
            .default(0)
            .interact()?;

        if let Some(network) = network_at(networks, index) {
            return Ok(MenuChoice::Sweep {
                asset_class,
                network,
            });
        }
    }
}
