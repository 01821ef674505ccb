//! Browser host.
//!
//! [`WebHost`] implements [`Host`] over the live DOM. Deferred work is
//! handed to the browser: `IntersectionObserver`s (one per [`Channel`]),
//! `gloo` timeouts and one-shot `transitionend` listeners. Their callbacks
//! hold a weak handle to the shared [`Runtime`] and feed the result back
//! through [`Page::dispatch`], exactly like the in-memory host's driver.
//!
//! [`start`] runs when the wasm module is instantiated: it reads the
//! behavior config embedded by `lowkey render`, binds the page and
//! registers the listeners the page asks for.

use crate::config::BehaviorConfig;
use crate::host::{Channel, Deferred, Host, PlaybackRejected, ScrollBehavior};
use crate::observe::{Intersection, ObserverOptions, is_visible};
use crate::page::{Event, EventKind, ListenTarget, Listener, Outcome, Page};
use crate::types::{Key, Rect, Viewport, ids};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Element, HtmlElement, HtmlMediaElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, NodeList, ScrollToOptions, TouchEvent, Window,
};

/// Page, host and registered listeners, shared with every callback.
pub struct Runtime {
    page: Option<Page<Element>>,
    host: WebHost,
    listeners: Vec<EventListener>,
}

type Handle = Weak<RefCell<Runtime>>;

/// Route one event into the page. Events arriving while the runtime is
/// already borrowed (a callback fired synchronously from inside a
/// dispatch) are dropped.
fn dispatch(handle: &Handle, event: Event<Element>) -> Outcome {
    let Some(runtime) = handle.upgrade() else {
        return Outcome::default();
    };
    let Ok(mut runtime) = runtime.try_borrow_mut() else {
        tracing::debug!("re-entrant event dropped");
        return Outcome::default();
    };
    let Runtime { page, host, .. } = &mut *runtime;
    match page {
        Some(page) => page.dispatch(host, event),
        None => Outcome::default(),
    }
}

struct NativeObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

pub struct WebHost {
    window: Window,
    document: web_sys::Document,
    handle: Handle,
    observers: BTreeMap<Channel, NativeObserver>,
}

impl WebHost {
    fn new(window: Window, document: web_sys::Document, handle: Handle) -> Self {
        Self {
            window,
            document,
            handle,
            observers: BTreeMap::new(),
        }
    }

    fn native_observer(&mut self, channel: Channel, options: &ObserverOptions) -> Option<&IntersectionObserver> {
        if !self.observers.contains_key(&channel) {
            let handle = self.handle.clone();
            let threshold = options.threshold;
            let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
                move |records: js_sys::Array, _observer: IntersectionObserver| {
                    let entries = records
                        .iter()
                        .filter_map(|record| record.dyn_into::<IntersectionObserverEntry>().ok())
                        .map(|entry| Intersection {
                            target: entry.target(),
                            visible: is_visible(
                                entry.is_intersecting(),
                                entry.intersection_ratio(),
                                threshold,
                            ),
                            ratio: entry.intersection_ratio(),
                        })
                        .collect();
                    dispatch(&handle, Event::Intersections { channel, entries });
                },
            );
            let init = IntersectionObserverInit::new();
            init.set_root_margin(&options.root_margin.to_css());
            init.set_threshold(&JsValue::from_f64(options.threshold));
            let observer =
                match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
                    Ok(observer) => observer,
                    Err(err) => {
                        tracing::warn!(?err, ?channel, "IntersectionObserver unavailable");
                        return None;
                    }
                };
            self.observers.insert(
                channel,
                NativeObserver {
                    observer,
                    _callback: callback,
                },
            );
        }
        self.observers.get(&channel).map(|o| &o.observer)
    }
}

fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn class_selector(classes: &[&str]) -> String {
    classes
        .iter()
        .map(|c| format!(".{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Host for WebHost {
    type Node = Element;

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn by_class(&self, class: &str) -> Vec<Element> {
        self.select_classes(&[class])
    }

    fn select_classes(&self, classes: &[&str]) -> Vec<Element> {
        if classes.is_empty() {
            return Vec::new();
        }
        elements(self.document.query_selector_all(&class_selector(classes)))
    }

    fn by_tag(&self, tag: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(tag))
    }

    fn descendants_by_class(&self, scope: &Element, class: &str) -> Vec<Element> {
        elements(scope.query_selector_all(&class_selector(&[class])))
    }

    fn descendants_by_tag(&self, scope: &Element, tag: &str) -> Vec<Element> {
        elements(scope.query_selector_all(tag))
    }

    fn closest_class(&self, node: &Element, class: &str) -> Option<Element> {
        node.closest(&class_selector(&[class])).ok().flatten()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn scroll_height(&self, node: &Element) -> f64 {
        f64::from(node.scroll_height())
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.top(), rect.left(), rect.width(), rect.height())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn current_year(&self) -> i32 {
        js_sys::Date::new_0().get_full_year() as i32
    }

    fn set_class(&mut self, node: &Element, class: &str, on: bool) {
        let _ = node.class_list().toggle_with_force(class, on);
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        let Some(html) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = html.style();
        let _ = if value.is_empty() {
            style.remove_property(property).map(drop)
        } else {
            style.set_property(property, value)
        };
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn focus(&mut self, node: &Element) {
        if let Some(html) = node.dyn_ref::<HtmlElement>() {
            let _ = html.focus();
        }
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn reflow(&mut self, node: &Element) {
        if let Some(html) = node.dyn_ref::<HtmlElement>() {
            let _ = html.offset_height();
        }
    }

    fn prepare_inline_video(&mut self, node: &Element) {
        if let Some(media) = node.dyn_ref::<HtmlMediaElement>() {
            media.set_muted(true);
            media.set_loop(true);
        }
        let _ = node.set_attribute("playsinline", "");
    }

    fn play(&mut self, node: &Element) -> Result<(), PlaybackRejected> {
        let media = node
            .dyn_ref::<HtmlMediaElement>()
            .ok_or_else(|| PlaybackRejected("not a media element".to_string()))?;
        let promise = media
            .play()
            .map_err(|err| PlaybackRejected(format!("{err:?}")))?;
        spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                tracing::trace!(?err, "playback refused");
            }
        });
        Ok(())
    }

    fn pause(&mut self, node: &Element) {
        if let Some(media) = node.dyn_ref::<HtmlMediaElement>() {
            let _ = media.pause();
        }
    }

    fn observe(&mut self, channel: Channel, options: &ObserverOptions, node: &Element) {
        if let Some(observer) = self.native_observer(channel, options) {
            observer.observe(node);
        }
    }

    fn unobserve(&mut self, channel: Channel, node: &Element) {
        if let Some(native) = self.observers.get(&channel) {
            native.observer.unobserve(node);
        }
    }

    fn schedule(&mut self, delay_ms: u32, task: Deferred<Element>) {
        let handle = self.handle.clone();
        Timeout::new(delay_ms, move || {
            dispatch(&handle, Event::Deferred(task));
        })
        .forget();
    }

    fn await_transition_end(&mut self, node: &Element) {
        let handle = self.handle.clone();
        let target = node.clone();
        EventListener::once(node, "transitionend", move |_| {
            dispatch(&handle, Event::TransitionEnd(target));
        })
        .forget();
    }
}

fn register(listener: &Listener<Element>, host: &WebHost, handle: &Handle) -> Option<EventListener> {
    let handle = handle.clone();
    let registered = match (&listener.target, listener.kind) {
        (ListenTarget::Window, EventKind::Scroll) => EventListener::new(&host.window, "scroll", move |_| {
            dispatch(&handle, Event::Scroll);
        }),
        (ListenTarget::Document, EventKind::KeyDown) => {
            EventListener::new(&host.document, "keydown", move |event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    dispatch(&handle, Event::KeyDown(Key::from_name(&event.key())));
                }
            })
        }
        (ListenTarget::Element(node), EventKind::Click) => {
            let target = node.clone();
            EventListener::new_with_options(
                node,
                "click",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    if dispatch(&handle, Event::Click(target.clone())).prevent_default {
                        event.prevent_default();
                    }
                },
            )
        }
        (ListenTarget::Element(node), kind @ (EventKind::TouchStart | EventKind::TouchEnd)) => {
            let name = if kind == EventKind::TouchStart { "touchstart" } else { "touchend" };
            EventListener::new(node, name, move |event| {
                let Some(x) = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|e| e.changed_touches().get(0))
                    .map(|touch| f64::from(touch.client_x()))
                else {
                    return;
                };
                let event = if kind == EventKind::TouchStart {
                    Event::TouchStart { x }
                } else {
                    Event::TouchEnd { x }
                };
                dispatch(&handle, event);
            })
        }
        (target, kind) => {
            tracing::debug!(?target, ?kind, "unsupported listener skipped");
            return None;
        }
    };
    Some(registered)
}

fn read_config(document: &web_sys::Document) -> BehaviorConfig {
    let Some(text) = document
        .get_element_by_id(ids::CONFIG_SCRIPT)
        .and_then(|script| script.text_content())
    else {
        return BehaviorConfig::default();
    };
    match serde_json::from_str::<BehaviorConfig>(&text) {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(%err, "embedded config rejected, using defaults");
                BehaviorConfig::default()
            }
        },
        Err(err) => {
            tracing::warn!(%err, "embedded config unreadable, using defaults");
            BehaviorConfig::default()
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let config = read_config(&document);

    let runtime = Rc::new_cyclic(|handle: &Handle| {
        RefCell::new(Runtime {
            page: None,
            host: WebHost::new(window, document, handle.clone()),
            listeners: Vec::new(),
        })
    });
    {
        let handle = Rc::downgrade(&runtime);
        let mut guard = runtime.borrow_mut();
        let state = &mut *guard;
        let page = Page::bind(&mut state.host, &config);
        state.listeners = page
            .listeners()
            .iter()
            .filter_map(|listener| register(listener, &state.host, &handle))
            .collect();
        state.page = Some(page);
    }
    // Lives for the lifetime of the page.
    std::mem::forget(runtime);
    Ok(())
}
