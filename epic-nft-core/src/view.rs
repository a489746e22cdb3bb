// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! What the page shows for a given state.

use serde::Serialize;

use crate::{MintConfig, MintState};

/// The primary button of the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CallToAction {
    Hidden,
    Connect { label: String },
    Mint { label: String, enabled: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// Everything the page renders, derived from a [`MintState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub call_to_action: CallToAction,
    pub counters: Option<String>,
    pub wrong_network: Option<String>,
    pub transaction: Option<Link>,
    pub error: Option<String>,
    pub footer: Vec<Link>,
}

impl View {
    pub fn new(state: &MintState, config: &MintConfig) -> Self {
        let wrong_network = state.network.is_wrong();
        let call_to_action = if wrong_network {
            CallToAction::Hidden
        } else if state.account.is_none() {
            CallToAction::Connect {
                label: "Connect to Wallet".to_string(),
            }
        } else if state.is_mining() {
            CallToAction::Mint {
                label: "Minting NFT...".to_string(),
                enabled: false,
            }
        } else {
            CallToAction::Mint {
                label: "Mint NFT".to_string(),
                enabled: true,
            }
        };
        let counters = match (wrong_network, state.counters.minted, state.counters.supply) {
            (false, Some(minted), Some(supply)) => {
                Some(format!("{minted}/{supply} NFTs minted so far"))
            }
            _ => None,
        };
        let transaction = state.transaction_url.as_ref().map(|href| Link {
            text: format!("See transaction URL in {}", config.explorer_host()),
            href: href.clone(),
        });
        View {
            call_to_action,
            counters,
            wrong_network: wrong_network.then(|| {
                format!(
                    "** You are in a wrong network. Please, switch to {} **",
                    config.network_name
                )
            }),
            transaction,
            error: state.error.clone(),
            footer: vec![
                Link {
                    text: "View Collection on OpenSea".to_string(),
                    href: config.collection_url.clone(),
                },
                Link {
                    text: format!("built on @{}", config.social_handle),
                    href: config.social_url(),
                },
            ],
        }
    }
}
