// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{cell::RefCell, rc::Rc};

use epic_nft_core::{Frontend, Notification, View};
use wasm_bindgen::JsValue;
use web_sys::Element;

use crate::render;

// Views are handed to JavaScript as plain objects.
static VIEW_SERIALIZER: serde_wasm_bindgen::Serializer =
    serde_wasm_bindgen::Serializer::json_compatible();

pub(crate) fn view_to_js(view: &View) -> Result<JsValue, serde_wasm_bindgen::Error> {
    serde::Serialize::serialize(view, &VIEW_SERIALIZER)
}

#[derive(Default)]
struct FrontendState {
    root: RefCell<Option<Element>>,
    on_change: RefCell<Option<js_sys::Function>>,
}

/// Shows notifications with `window.alert` and renders views into the root element.
#[derive(Clone, Default)]
pub struct BrowserFrontend(Rc<FrontendState>);

impl BrowserFrontend {
    pub fn set_root(&self, root: Element) {
        *self.0.root.borrow_mut() = Some(root);
    }

    pub fn set_on_change(&self, callback: js_sys::Function) {
        *self.0.on_change.borrow_mut() = Some(callback);
    }
}

impl Frontend for BrowserFrontend {
    fn notify(&self, notification: &Notification) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(%notification, "no window to show the notification");
            return;
        };
        if let Err(error) = window.alert_with_message(&notification.to_string()) {
            tracing::warn!(?error, "failed to show the notification");
        }
    }

    fn render(&self, view: &View) {
        let root = self.0.root.borrow().clone();
        if let Some(root) = root {
            let rendered = root
                .owner_document()
                .ok_or_else(|| JsValue::from_str("the root element is not in a document"))
                .and_then(|document| render::render(&document, &root, view));
            if let Err(error) = rendered {
                tracing::warn!(?error, "failed to render the page");
            }
        }
        let on_change = self.0.on_change.borrow().clone();
        if let Some(on_change) = on_change {
            let result = view_to_js(view)
                .map_err(JsValue::from)
                .and_then(|view| on_change.call1(&JsValue::NULL, &view));
            if let Err(error) = result {
                tracing::warn!(?error, "the change callback failed");
            }
        }
    }
}
