use crate::error::GalaxyError;
use crate::galaxy::config::ControlScheme;
use crate::galaxy::state::InteractionState;
use crate::galaxy::Galaxy;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

const BUTTON_STYLE: &str = "position: absolute; right: 10px; padding: 5px 10px; \
    background: rgba(0, 0, 0, 0.5); color: white; border: none; border-radius: 5px; \
    cursor: pointer;";

struct Button {
    element: HtmlElement,
    // Kept alive for as long as the button is in the DOM
    _on_click: Option<Closure<dyn FnMut()>>,
}

/// Overlay buttons for the toggle and speed controls.
pub struct Overlay {
    buttons: Vec<Button>,
    toggle: Option<HtmlElement>,
    readout: Option<HtmlElement>,
}

impl Overlay {
    pub fn new(
        document: &Document,
        parent: &Element,
        scheme: ControlScheme,
        galaxy: Rc<RefCell<Galaxy>>,
    ) -> Result<Self, GalaxyError> {
        let mut overlay = Overlay { buttons: Vec::new(), toggle: None, readout: None };
        let state = galaxy.borrow().state().clone();

        if scheme.toggle_via_button {
            let on_click = action(&galaxy, InteractionState::toggle_rotation);
            let label = state.toggle_label();
            overlay.toggle = Some(overlay.add_button(document, parent, 10, label, Some(on_click))?);
        }

        if scheme.speed_adjustable {
            let faster = action(&galaxy, InteractionState::faster);
            overlay.add_button(document, parent, 50, "Faster", Some(faster))?;
            let readout = state.speed_readout().to_string();
            overlay.readout = Some(overlay.add_button(document, parent, 70, &readout, None)?);
            let slower = action(&galaxy, InteractionState::slower);
            overlay.add_button(document, parent, 90, "Slower", Some(slower))?;
        }

        Ok(overlay)
    }

    fn add_button(
        &mut self,
        document: &Document,
        parent: &Element,
        top: u32,
        label: &str,
        on_click: Option<Closure<dyn FnMut()>>,
    ) -> Result<HtmlElement, GalaxyError> {
        let element = document
            .create_element("button")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| GalaxyError::Resource("button element"))?;
        element.set_attribute("style", &format!("{} top: {}px;", BUTTON_STYLE, top))?;
        element.set_text_content(Some(label));
        if let Some(callback) = &on_click {
            element.set_onclick(Some(callback.as_ref().unchecked_ref()));
        }
        parent.append_child(&element)?;

        self.buttons.push(Button { element: element.clone(), _on_click: on_click });
        Ok(element)
    }

    /// Brings the labels in line with the state after any change.
    pub fn refresh(&self, state: &InteractionState) {
        if let Some(toggle) = &self.toggle {
            toggle.set_text_content(Some(state.toggle_label()));
        }
        if let Some(readout) = &self.readout {
            readout.set_text_content(Some(&state.speed_readout().to_string()));
        }
    }

    pub fn remove(&mut self) {
        for button in self.buttons.drain(..) {
            button.element.set_onclick(None);
            button.element.remove();
        }
        self.toggle = None;
        self.readout = None;
    }
}

// Buttons left behind by a failed build are taken out with it.
impl Drop for Overlay {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Wraps a state mutation as a click handler. Labels are refreshed by the
/// frame loop through [`Overlay::refresh`].
fn action(galaxy: &Rc<RefCell<Galaxy>>, apply: fn(&mut InteractionState)) -> Closure<dyn FnMut()> {
    let galaxy = galaxy.clone();
    Closure::wrap(Box::new(move || {
        apply(galaxy.borrow_mut().state_mut());
    }) as Box<dyn FnMut()>)
}
