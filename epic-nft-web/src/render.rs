// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Builds the DOM of the page from a [`View`].

use epic_nft_core::view::{CallToAction, Link, View};
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

/// The value of the `data-action` attribute of the connection button.
pub const CONNECT_ACTION: &str = "connect";
/// The value of the `data-action` attribute of the mint button.
pub const MINT_ACTION: &str = "mint";

fn element(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    Ok(element)
}

fn text(document: &Document, tag: &str, class: &str, content: &str) -> Result<Element, JsValue> {
    let element = element(document, tag, class)?;
    element.set_text_content(Some(content));
    Ok(element)
}

fn link(document: &Document, link: &Link) -> Result<Element, JsValue> {
    let anchor = text(document, "a", "footer-text", &link.text)?;
    anchor.set_attribute("href", &link.href)?;
    anchor.set_attribute("target", "_blank")?;
    anchor.set_attribute("rel", "noopener noreferrer")?;
    Ok(anchor)
}

fn button(
    document: &Document,
    action: &str,
    label: &str,
    enabled: bool,
) -> Result<Element, JsValue> {
    let button = text(document, "button", "cta-button connect-wallet-button", label)?;
    button.set_attribute("data-action", action)?;
    if !enabled {
        button.set_attribute("disabled", "")?;
    }
    Ok(button)
}

/// Replaces the content of `root` with the page for `view`.
pub fn render(document: &Document, root: &Element, view: &View) -> Result<(), JsValue> {
    let container = element(document, "div", "container")?;

    let header = element(document, "div", "header-container")?;
    header.append_child(&text(document, "p", "header gradient-text", "My NFT Collection")?)?;
    header.append_child(&text(
        document,
        "p",
        "sub-text",
        "Each unique. Each beautiful. Discover your NFT today.",
    )?)?;
    match &view.call_to_action {
        CallToAction::Hidden => {}
        CallToAction::Connect { label } => {
            header.append_child(&button(document, CONNECT_ACTION, label, true)?)?;
        }
        CallToAction::Mint { label, enabled } => {
            header.append_child(&button(document, MINT_ACTION, label, *enabled)?)?;
        }
    }
    for line in [&view.counters, &view.wrong_network, &view.error]
        .into_iter()
        .flatten()
    {
        header.append_child(&text(document, "p", "sub-text", line)?)?;
    }
    container.append_child(&header)?;

    let transaction = element(document, "div", "")?;
    if let Some(transaction_link) = &view.transaction {
        transaction.append_child(&link(document, transaction_link)?)?;
    }
    container.append_child(&transaction)?;

    let footer = element(document, "div", "footer-container")?;
    for footer_link in &view.footer {
        footer.append_child(&link(document, footer_link)?)?;
    }
    container.append_child(&footer)?;

    root.set_text_content(None);
    root.append_child(&container)?;
    Ok(())
}
