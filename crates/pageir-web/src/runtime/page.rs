use super::dom::{self, Dom};
use super::state::{conditions_hold, StateStore};
use super::{
    FetchRequest, KeyframeAnimation, RuntimeError, RuntimeHost, Signal, ToastView,
    DEFAULT_SIGNAL, DELEGATED_EVENTS, TOAST_DISMISS_MS, TOAST_REMOVE_DELAY_MS, TOAST_SHOW_DELAY_MS,
};
use crate::compile::{
    ATTR_BIND, ATTR_EVENTS, ATTR_ID, ATTR_MOTION, ATTR_SHOW, ATTR_TOAST_REGION, STATE_SCRIPT_ID,
};
use crate::value::{js_string, js_truthy};
use pageir_core::model::{
    Effect, EventBinding, HttpMethod, IterationKeyword, Iterations, MotionSpec, MotionTrigger,
    ToastVariant,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const TOAST_CLASS: &str = "ir-toast";
const TOAST_SHOW_CLASS: &str = "ir-toast--show";
const THEMED_TOAST_REGION_CLASS: &str = "fluent-toast-region";
const MAX_FOCUS_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    ShowToast(usize),
    HideToast(usize),
    RemoveToast(usize),
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due: u64,
    seq: u64,
    action: TimerAction,
}

#[derive(Debug, Clone)]
struct FetchJob {
    request: FetchRequest,
    result_key: Option<String>,
}

/// One loaded page. All interaction goes through `&mut self`, so state
/// writes and DOM sync happen one at a time.
#[derive(Debug, Clone)]
pub struct Page {
    dom: Dom,
    state: StateStore,
    ids: HashMap<String, usize>,
    mounted: bool,
    clock: u64,
    next_seq: u64,
    timers: Vec<Timer>,
    toasts: Vec<(usize, ToastVariant)>,
    signals: Vec<Signal>,
    animations: Vec<KeyframeAnimation>,
    animation_classes: Vec<(usize, String)>,
    focused: Option<usize>,
    focus_depth: usize,
    observed: Vec<usize>,
    state_armed: HashSet<usize>,
    pending: Vec<FetchJob>,
}

fn parse_bootstrap(script: &str) -> Result<Map<String, Value>, RuntimeError> {
    let body = script.trim();
    let body = body.strip_prefix("window.__irState").unwrap_or(body).trim_start();
    let body = body.strip_prefix('=').unwrap_or(body).trim();
    let body = body.strip_suffix(';').unwrap_or(body);
    serde_json::from_str(body).map_err(RuntimeError::Bootstrap)
}

impl Page {
    pub fn load(html: &str) -> Result<Self, RuntimeError> {
        let dom = dom::parse(html)?;

        let mut ids = HashMap::new();
        for index in dom.preorder() {
            if let Some(id) = dom.attr(index, ATTR_ID) {
                ids.entry(id.to_string()).or_insert(index);
            }
        }

        let bootstrap =
            dom.find_first(|el| el.tag == "script" && el.attr("id") == Some(STATE_SCRIPT_ID));
        let initial = match bootstrap {
            Some(index) => parse_bootstrap(&dom.text_content(index))?,
            None => Map::new(),
        };

        debug!(elements = dom.len(), nodes = ids.len(), "page loaded");
        Ok(Self {
            dom,
            state: StateStore::new(initial),
            ids,
            mounted: false,
            clock: 0,
            next_seq: 0,
            timers: Vec::new(),
            toasts: Vec::new(),
            signals: Vec::new(),
            animations: Vec::new(),
            animation_classes: Vec::new(),
            focused: None,
            focus_depth: 0,
            observed: Vec::new(),
            state_armed: HashSet::new(),
            pending: Vec::new(),
        })
    }

    /// Runs on-mount motion, starts watching on-visible elements and syncs
    /// bound elements with the initial state. Later calls do nothing.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        for index in self.dom.preorder() {
            let Some(spec) = self.motion_of(index) else { continue };
            match spec.trigger() {
                MotionTrigger::OnMount => self.apply_motion(index, &spec),
                MotionTrigger::OnVisible => self.observed.push(index),
                _ => {}
            }
        }
        self.sync();
    }

    /// Fires `event` at the element with `data-ir-id` `id`. Returns how many
    /// effects ran.
    pub fn dispatch(
        &mut self,
        id: &str,
        event: &str,
        host: &mut dyn RuntimeHost,
    ) -> Result<usize, RuntimeError> {
        if !DELEGATED_EVENTS.contains(&event) {
            return Err(RuntimeError::UnsupportedEvent(event.to_string()));
        }
        let target = self.element(id)?;
        match event {
            "focus" => self.focused = Some(target),
            "blur" if self.focused == Some(target) => self.focused = None,
            _ => {}
        }
        let ran = self.run_bindings(target, event);
        if event == "click" {
            self.trigger_motion(target, MotionTrigger::OnPress);
        }
        self.settle(host);
        Ok(ran)
    }

    /// Sets a form control's value as typed by a user, then fires `input`.
    pub fn input(
        &mut self,
        id: &str,
        value: &str,
        host: &mut dyn RuntimeHost,
    ) -> Result<usize, RuntimeError> {
        let target = self.element(id)?;
        self.dom.set_value(target, value);
        self.dispatch(id, "input", host)
    }

    /// Pointer entering the element: `hover` bindings and on-hover motion.
    pub fn pointer_enter(
        &mut self,
        id: &str,
        host: &mut dyn RuntimeHost,
    ) -> Result<usize, RuntimeError> {
        let target = self.element(id)?;
        let ran = self.run_bindings(target, "hover");
        self.trigger_motion(target, MotionTrigger::OnHover);
        self.settle(host);
        Ok(ran)
    }

    /// The element scrolled into view for the first time. Returns whether
    /// a watched motion played.
    pub fn reveal(&mut self, id: &str) -> Result<bool, RuntimeError> {
        let target = self.element(id)?;
        let Some(pos) = self.observed.iter().position(|&i| i == target) else {
            return Ok(false);
        };
        self.observed.remove(pos);
        if let Some(spec) = self.motion_of(target) {
            self.apply_motion(target, &spec);
        }
        Ok(true)
    }

    /// Moves the clock forward, firing due timers in order.
    pub fn advance(&mut self, ms: u64) {
        let until = self.clock.saturating_add(ms);
        while let Some(pos) = self.next_timer(until) {
            let timer = self.timers.remove(pos);
            self.clock = timer.due;
            match timer.action {
                TimerAction::ShowToast(toast) => self.dom.add_class(toast, TOAST_SHOW_CLASS),
                TimerAction::HideToast(toast) => {
                    self.dom.remove_class(toast, TOAST_SHOW_CLASS);
                    self.schedule(TOAST_REMOVE_DELAY_MS, TimerAction::RemoveToast(toast));
                }
                TimerAction::RemoveToast(toast) => self.dom.detach(toast),
            }
        }
        self.clock = until;
    }

    /// The element's animation finished: drops classes added by
    /// `runAnimation` effects.
    pub fn animation_end(&mut self, id: &str) -> Result<(), RuntimeError> {
        let target = self.element(id)?;
        let dom = &mut self.dom;
        self.animation_classes.retain(|(index, class)| {
            if *index == target {
                dom.remove_class(target, class);
                false
            } else {
                true
            }
        });
        Ok(())
    }

    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn state(&self) -> &Value {
        self.state.root()
    }

    pub fn set_state(&mut self, key: &str, value: Value) {
        if !self.state.set(key, value) {
            warn!(key, "state write skipped: path runs through a scalar or a bad array index");
        }
        self.sync();
    }

    pub fn text_content(&self, id: &str) -> Option<String> {
        self.ids.get(id).map(|&i| self.dom.text_content(i))
    }

    pub fn value(&self, id: &str) -> Option<String> {
        self.ids.get(id).map(|&i| self.dom.form_value(i))
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<&str> {
        self.ids.get(id).and_then(|&i| self.dom.attr(i, name))
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.ids.get(id).is_some_and(|&i| self.dom.is_rendered(i))
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.ids.get(id).is_some_and(|&i| self.dom.has_class(i, class))
    }

    /// `data-ir-id` of the focused element, if it has one.
    pub fn focused(&self) -> Option<&str> {
        self.focused.and_then(|i| self.dom.attr(i, ATTR_ID))
    }

    /// Toasts still in the document, oldest first.
    pub fn toasts(&self) -> Vec<ToastView> {
        self.toasts
            .iter()
            .filter(|(index, _)| self.dom.is_attached(*index))
            .map(|&(index, variant)| ToastView {
                message: self.dom.text_content(index),
                variant,
                shown: self.dom.has_class(index, TOAST_SHOW_CLASS),
            })
            .collect()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn animations(&self) -> &[KeyframeAnimation] {
        &self.animations
    }

    /// Milliseconds advanced since load.
    pub fn now(&self) -> u64 {
        self.clock
    }

    fn element(&self, id: &str) -> Result<usize, RuntimeError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownNode(id.to_string()))
    }

    fn lookup(&self, id: Option<&str>) -> Option<usize> {
        id.filter(|id| !id.is_empty()).and_then(|id| self.ids.get(id).copied())
    }

    fn motion_of(&self, index: usize) -> Option<MotionSpec> {
        let raw = self.dom.attr(index, ATTR_MOTION)?;
        match serde_json::from_str(raw) {
            Ok(spec) => Some(spec),
            Err(err) => {
                debug!(error = %err, "ignoring unreadable motion attribute");
                None
            }
        }
    }

    fn bindings_of(&self, index: usize) -> Vec<EventBinding> {
        let Some(raw) = self.dom.attr(index, ATTR_EVENTS) else { return Vec::new() };
        serde_json::from_str(raw).unwrap_or_else(|err| {
            debug!(error = %err, "ignoring unreadable events attribute");
            Vec::new()
        })
    }

    fn run_bindings(&mut self, target: usize, event: &str) -> usize {
        let Some(source) = self.dom.closest(target, |el| el.attrs.contains_key(ATTR_EVENTS)) else {
            return 0;
        };
        let mut ran = 0;
        for binding in self.bindings_of(source) {
            if binding.event != event || !conditions_hold(&self.state, &binding.when) {
                continue;
            }
            for effect in &binding.effects {
                self.execute(effect, source);
                ran += 1;
            }
        }
        ran
    }

    fn execute(&mut self, effect: &Effect, source: usize) {
        debug!(effect = effect.kind(), "running effect");
        match effect {
            Effect::ToggleTarget { target } => {
                let Some(index) = self.lookup(target.as_deref()) else { return };
                let hidden = self.dom.style_property(index, "display").as_deref() == Some("none")
                    || self.dom.attr(index, "hidden").is_some();
                if hidden {
                    self.dom.set_style_property(index, "display", "");
                    self.dom.remove_attr(index, "hidden");
                } else {
                    self.dom.set_style_property(index, "display", "none");
                }
            }
            Effect::SetState { key, value } => {
                if let Some(key) = key.as_deref().filter(|k| !k.is_empty()) {
                    self.set_state(key, value.clone());
                }
            }
            Effect::AppendStateArray { key, value } => {
                if let Some(key) = key.as_deref().filter(|k| !k.is_empty()) {
                    let mut items = match self.state.get(key) {
                        Some(Value::Array(items)) => items.clone(),
                        _ => Vec::new(),
                    };
                    items.push(value.clone());
                    self.set_state(key, Value::Array(items));
                }
            }
            Effect::FetchJson { url, method, body, result_key } => {
                let Some(url) = url.as_deref().filter(|u| !u.is_empty()) else { return };
                let method = method.unwrap_or(HttpMethod::Get);
                let body = body
                    .as_ref()
                    .filter(|b| js_truthy(Some(*b)) && method != HttpMethod::Get)
                    .cloned();
                self.pending.push(FetchJob {
                    request: FetchRequest {
                        method: method.as_str().to_string(),
                        url: url.to_string(),
                        body,
                    },
                    result_key: result_key.clone(),
                });
            }
            Effect::Emit { event } => {
                let name = event.as_deref().filter(|e| !e.is_empty()).unwrap_or(DEFAULT_SIGNAL);
                self.signals.push(Signal {
                    name: name.to_string(),
                    source: self.dom.attr(source, ATTR_ID).map(str::to_string),
                });
            }
            Effect::RunAnimation { target, animation } => {
                let index = match target.as_deref().filter(|t| !t.is_empty()) {
                    Some(id) => self.ids.get(id).copied(),
                    None => Some(source),
                };
                let name = animation.as_deref().filter(|a| !a.is_empty());
                let (Some(index), Some(name)) = (index, name) else {
                    return;
                };
                let class = format!("ir-animate-{name}");
                self.dom.add_class(index, &class);
                self.animation_classes.push((index, class));
            }
            Effect::Focus { target, selector } => {
                let index = match selector.as_deref().filter(|s| !s.is_empty()) {
                    Some(selector) => self.dom.query_selector(selector),
                    None => self.lookup(target.as_deref()),
                };
                if let Some(index) = index {
                    self.move_focus(index);
                }
            }
            Effect::Toast { message, variant } => {
                let Some(message) = message.as_deref().filter(|m| !m.is_empty()) else { return };
                let region = self
                    .dom
                    .find_first(|el| el.attrs.contains_key(ATTR_TOAST_REGION))
                    .or_else(|| {
                        self.dom.find_first(|el| {
                            el.attr("class").is_some_and(|c| {
                                c.split_whitespace().any(|c| c == THEMED_TOAST_REGION_CLASS)
                            })
                        })
                    });
                let Some(region) = region else { return };
                let variant = variant.unwrap_or(ToastVariant::Info);
                let toast = self.dom.create_child(region, "div");
                let class = format!("{TOAST_CLASS} {TOAST_CLASS}--{}", variant.as_str());
                self.dom.set_attr(toast, "class", class);
                self.dom.set_text(toast, message);
                self.toasts.push((toast, variant));
                self.schedule(TOAST_SHOW_DELAY_MS, TimerAction::ShowToast(toast));
                self.schedule(TOAST_DISMISS_MS, TimerAction::HideToast(toast));
            }
        }
    }

    /// Blurs the focused element, then focuses `index`, running the blur and
    /// focus bindings a real `focus()` call would. Focusing the focused
    /// element fires nothing. Past `MAX_FOCUS_DEPTH` nested transitions focus
    /// still moves but no bindings run, which ends focus ping-pong.
    fn move_focus(&mut self, index: usize) {
        if self.focused == Some(index) {
            return;
        }
        let previous = self.focused.take();
        if self.focus_depth >= MAX_FOCUS_DEPTH {
            debug!("focus bindings suppressed: nesting too deep");
            self.focused = Some(index);
            return;
        }
        self.focus_depth += 1;
        if let Some(previous) = previous {
            self.run_bindings(previous, "blur");
        }
        self.focused = Some(index);
        self.run_bindings(index, "focus");
        self.focus_depth -= 1;
    }

    fn trigger_motion(&mut self, target: usize, trigger: MotionTrigger) {
        let Some(index) = self.dom.closest(target, |el| el.attrs.contains_key(ATTR_MOTION)) else {
            return;
        };
        if let Some(spec) = self.motion_of(index).filter(|spec| spec.trigger() == trigger) {
            self.apply_motion(index, &spec);
        }
    }

    fn apply_motion(&mut self, index: usize, spec: &MotionSpec) {
        match spec {
            MotionSpec::Preset(preset) => {
                self.dom.add_class(index, &format!("ir-motion-{}", preset.preset.as_str()));
                if let Some(duration) = preset.duration.filter(|d| *d > 0) {
                    let duration = format!("{duration}ms");
                    self.dom.set_style_property(index, "animation-duration", &duration);
                }
                if let Some(delay) = preset.delay.filter(|d| *d > 0) {
                    self.dom.set_style_property(index, "animation-delay", &format!("{delay}ms"));
                }
                if let Some(easing) = preset.easing.as_deref().filter(|e| !e.is_empty()) {
                    self.dom.set_style_property(index, "animation-timing-function", easing);
                }
            }
            MotionSpec::Keyframes(frames) => {
                let iterations = match frames.iterations {
                    Some(Iterations::Keyword(IterationKeyword::Infinite)) => f64::INFINITY,
                    Some(Iterations::Count(n)) if n > 0 => f64::from(n),
                    _ => 1.0,
                };
                self.animations.push(KeyframeAnimation {
                    node_id: self.dom.attr(index, ATTR_ID).map(str::to_string),
                    keyframes: frames.keyframes.clone(),
                    duration_ms: frames.duration.filter(|d| *d > 0).unwrap_or(300),
                    delay_ms: frames.delay.unwrap_or(0),
                    easing: frames
                        .easing
                        .clone()
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| "ease".to_string()),
                    iterations,
                    fill: frames.fill.map(|f| f.as_str()).unwrap_or("forwards").to_string(),
                });
            }
        }
    }

    /// Refreshes bound and conditionally shown elements from state, then
    /// plays on-state motion whose key just turned truthy.
    fn sync(&mut self) {
        let order = self.dom.preorder();
        for &index in &order {
            if let Some(key) = self.dom.attr(index, ATTR_BIND).map(str::to_string) {
                if let Some(value) = self.state.get(&key) {
                    let text = js_string(value);
                    if self.dom.is_form_control(index) {
                        self.dom.set_value(index, &text);
                    } else {
                        self.dom.set_text(index, &text);
                    }
                }
            }
            if let Some(key) = self.dom.attr(index, ATTR_SHOW).map(str::to_string) {
                let shown = js_truthy(self.state.get(&key));
                self.dom.set_style_property(index, "display", if shown { "" } else { "none" });
            }
        }

        for &index in &order {
            let Some(spec) = self.motion_of(index) else { continue };
            if spec.trigger() != MotionTrigger::OnState {
                continue;
            }
            let key = match &spec {
                MotionSpec::Preset(p) => p.state_key.as_deref(),
                MotionSpec::Keyframes(k) => k.state_key.as_deref(),
            };
            if js_truthy(key.and_then(|k| self.state.get(k))) {
                if self.state_armed.insert(index) {
                    self.apply_motion(index, &spec);
                }
            } else {
                self.state_armed.remove(&index);
            }
        }
    }

    fn settle(&mut self, host: &mut dyn RuntimeHost) {
        while !self.pending.is_empty() {
            for job in std::mem::take(&mut self.pending) {
                match host.fetch(&job.request) {
                    Ok(data) => {
                        if let Some(key) = job.result_key.as_deref().filter(|k| !k.is_empty()) {
                            self.set_state(key, data);
                        }
                    }
                    Err(err) => warn!(url = %job.request.url, error = %err, "fetchJson failed"),
                }
            }
        }
    }

    fn schedule(&mut self, delay: u64, action: TimerAction) {
        let due = self.clock.saturating_add(delay);
        self.timers.push(Timer { due, seq: self.next_seq, action });
        self.next_seq += 1;
    }

    fn next_timer(&self, until: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(pos, _)| pos)
    }
}
