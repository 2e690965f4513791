//! Scenario files and the runner that replays them.
//!
//! A scenario is a TOML file with optional extra `[[panels]]` declarations
//! and a list of `[[steps]]`:
//!
//! ```toml
//! [[panels]]
//! id = "Inventory"
//! mode = "push"
//!
//! [[steps]]
//! action = "open"
//! panel = "Inventory"
//!
//! [[steps]]
//! action = "close"
//! panel = "Inventory"
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde::Deserialize;

use panelnav_config::{Config, PanelEntry};
use panelnav_core::{ControllerKind, LayerId, LifecycleState, NavError, PanelId, UiRoot};
use panelnav_logger as logger;
use panelnav_navigation::NavigationController;
use panelnav_registry::PanelRegistry;

use crate::trace::{self, TraceHook, TraceLoader};

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Open {
        panel: String,
        controller: Option<String>,
    },
    /// Start a suspending open; it completes on the next `settle`.
    OpenAsync {
        panel: String,
        controller: Option<String>,
    },
    /// Resume every suspended load.
    Settle,
    Close {
        panel: String,
    },
    Hide {
        panel: String,
    },
    Unload {
        panel: String,
    },
    UnloadAll,
    PopToRoot {
        layer: LayerId,
    },
    ClearLayer {
        layer: LayerId,
    },
    ClearAll,
    SetLayer {
        panel: String,
        layer: LayerId,
    },
    Tick,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Open { panel, .. } => write!(f, "open {}", panel),
            Step::OpenAsync { panel, .. } => write!(f, "open_async {}", panel),
            Step::Settle => write!(f, "settle"),
            Step::Close { panel } => write!(f, "close {}", panel),
            Step::Hide { panel } => write!(f, "hide {}", panel),
            Step::Unload { panel } => write!(f, "unload {}", panel),
            Step::UnloadAll => write!(f, "unload_all"),
            Step::PopToRoot { layer } => write!(f, "pop_to_root {}", layer),
            Step::ClearLayer { layer } => write!(f, "clear_layer {}", layer),
            Step::ClearAll => write!(f, "clear_all"),
            Step::SetLayer { panel, layer } => write!(f, "set_layer {} {}", panel, layer),
            Step::Tick => write!(f, "tick"),
        }
    }
}

/// Parsed scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Declarations added to the configured ones
    #[serde(default)]
    pub panels: Vec<PanelEntry>,

    /// Asset paths the loader reports as unavailable
    #[serde(default)]
    pub missing: Vec<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }
}

/// Errors of spawned `open_async` tasks, oldest first.
type Failures = Rc<RefCell<Vec<(PanelId, NavError)>>>;

/// Replays steps against a navigation controller with the tracing backend.
pub struct Runner {
    nav: Rc<NavigationController>,
    loader: Rc<TraceLoader>,
    hook: Rc<TraceHook>,
    pool: LocalPool,
    failures: Failures,
    /// Configured controller kind per panel
    controllers: HashMap<PanelId, ControllerKind>,
}

impl Runner {
    /// Build from the configuration plus the scenario's own declarations.
    pub fn new(config: &Config, scenario: &Scenario) -> Result<Self> {
        let mut config = config.clone();
        config.panels.extend(scenario.panels.iter().cloned());

        let declarations = config
            .declarations()
            .context("Invalid panel declarations")?;
        let controllers = config
            .panels
            .iter()
            .map(|entry| {
                (
                    PanelId::new(&entry.id),
                    ControllerKind::owned(entry.controller_name()),
                )
            })
            .collect();

        let loader = Rc::new(TraceLoader::new(scenario.missing.iter().cloned()));
        let hook = Rc::new(TraceHook::default());
        let registry = PanelRegistry::new(declarations, loader.clone());
        let nav = NavigationController::new(
            UiRoot::new(config.general.root_name.as_str()),
            registry,
            trace::catalog(config.controller_kinds()),
        )
        .with_hook(hook.clone());

        Ok(Self {
            nav: Rc::new(nav),
            loader,
            hook,
            pool: LocalPool::new(),
            failures: Failures::default(),
            controllers,
        })
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    /// Run every step, then settle outstanding loads.
    ///
    /// Returns one report line per step. A suspended open that fails fails
    /// the step that resumed it.
    pub fn run(&mut self, steps: &[Step]) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(steps.len() + 1);
        for (index, step) in steps.iter().enumerate() {
            let outcome = self
                .apply(step)
                .with_context(|| format!("Step {} ({}) failed", index + 1, step))?;
            lines.push(self.describe(index + 1, &step.to_string(), outcome));
        }

        if self.loader.in_flight() > 0 {
            let outcome = self.settle().context("Settling pending loads failed")?;
            lines.push(self.describe(steps.len() + 1, "settle (end)", outcome));
        }
        Ok(lines)
    }

    fn apply(&mut self, step: &Step) -> Result<Option<String>> {
        let outcome = match step {
            Step::Open { panel, controller } => {
                let id = PanelId::new(panel);
                let kind = self.kind_for(&id, controller.as_deref());
                match self.nav.open(&id, kind)? {
                    Some(_) => None,
                    None => Some("unavailable".to_string()),
                }
            }
            Step::OpenAsync { panel, controller } => {
                let id = PanelId::new(panel);
                let kind = self.kind_for(&id, controller.as_deref());
                let nav = self.nav.clone();
                let failures = self.failures.clone();
                self.pool.spawner().spawn_local(async move {
                    match nav.open_async(&id, kind).await {
                        Ok(Some(_)) => {}
                        Ok(None) => logger::info(format!("Async open of '{}' not shown", id)),
                        Err(err) => failures.borrow_mut().push((id, err)),
                    }
                })?;
                self.drive()?;
                Some("loading".to_string())
            }
            Step::Settle => self.settle()?,
            Step::Close { panel } => {
                let closed = self.nav.close(&PanelId::new(panel))?;
                (!closed).then(|| "not stacked".to_string())
            }
            Step::Hide { panel } => {
                self.nav.hide(&PanelId::new(panel))?;
                None
            }
            Step::Unload { panel } => {
                let unloaded = self.nav.unload(&PanelId::new(panel))?;
                (!unloaded).then(|| "not loaded".to_string())
            }
            Step::UnloadAll => Some(format!("{} unloaded", self.nav.unload_all())),
            Step::PopToRoot { layer } => {
                let popped = self.nav.pop_to_root(*layer);
                Some(format!("popped {}", join(&popped)))
            }
            Step::ClearLayer { layer } => {
                let cleared = self.nav.clear_layer(*layer);
                Some(format!("cleared {}", join(&cleared)))
            }
            Step::ClearAll => {
                let cleared = self.nav.clear_all();
                Some(format!("cleared {}", join(&cleared)))
            }
            Step::SetLayer { panel, layer } => {
                let moved = self.nav.set_layer(&PanelId::new(panel), *layer)?;
                (!moved).then(|| "unchanged".to_string())
            }
            Step::Tick => Some(format!("{} refreshed", self.nav.tick())),
        };
        Ok(outcome)
    }

    fn settle(&mut self) -> Result<Option<String>> {
        let resumed = self.loader.settle();
        self.drive()?;
        Ok(Some(format!("{} resumed", resumed)))
    }

    /// Run spawned opens until they stall, surfacing the first failure.
    fn drive(&mut self) -> Result<()> {
        self.pool.run_until_stalled();
        let failed = std::mem::take(&mut *self.failures.borrow_mut());
        match failed.into_iter().next() {
            Some((id, err)) => {
                Err(anyhow::Error::new(err).context(format!("Async open of '{}' failed", id)))
            }
            None => Ok(()),
        }
    }

    /// Explicit kind, else the configured one, else the panel id.
    fn kind_for(&self, id: &PanelId, explicit: Option<&str>) -> ControllerKind {
        match explicit {
            Some(kind) => ControllerKind::owned(kind),
            None => self
                .controllers
                .get(id)
                .cloned()
                .unwrap_or_else(|| ControllerKind::owned(id.as_str())),
        }
    }

    fn describe(&self, number: usize, step: &str, outcome: Option<String>) -> String {
        let mut line = format!("{:>3}. {}", number, step);
        let events = self.hook.take();
        if !events.is_empty() {
            line.push_str(&format!("  [{}]", events.join(" ")));
        }
        if let Some(outcome) = outcome {
            line.push_str(&format!("  ({})", outcome));
        }
        line
    }

    /// Final layer stacks, one line per layer, bottom to top.
    ///
    /// Visible members are marked with `*`.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for layer in self.nav.layers() {
            let members: Vec<String> = self
                .nav
                .stack(layer)
                .iter()
                .map(|id| match self.nav.state(id) {
                    LifecycleState::Visible => format!("{}*", id),
                    _ => id.to_string(),
                })
                .collect();
            out.push_str(&format!("layer {}: {}\n", layer, members.join(" ")));
        }
        out
    }
}

fn join(ids: &[PanelId]) -> String {
    if ids.is_empty() {
        return "nothing".to_string();
    }
    ids.iter().map(PanelId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
missing = ["ui/broken"]

[[panels]]
id = "Inventory"
path = "ui/inventory"
mode = "push"
controller = "list"

[[panels]]
id = "Settings"
mode = "push"

[[panels]]
id = "Toast"
mode = "overlay"

[[panels]]
id = "Broken"
path = "ui/broken"
mode = "push"

[[steps]]
action = "open"
panel = "Inventory"

[[steps]]
action = "open"
panel = "Settings"

[[steps]]
action = "close"
panel = "Settings"
"#;

    fn runner(scenario: &Scenario) -> Runner {
        Runner::new(&Config::default(), scenario).unwrap()
    }

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.panels.len(), 4);
        assert_eq!(
            scenario.steps[0],
            Step::Open {
                panel: "Inventory".to_string(),
                controller: None
            }
        );
        assert_eq!(scenario.steps[2].to_string(), "close Settings");
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Scenario::parse("[[steps]]\naction = \"teleport\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_run_inventory_settings() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let mut runner = runner(&scenario);
        let lines = runner.run(&scenario.steps).unwrap();

        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("[-Settings +Inventory]"));
        assert_eq!(runner.report(), "layer 0: Inventory*\n");
        assert_eq!(
            runner.navigation().state(&PanelId::new("Settings")),
            LifecycleState::Hidden
        );
    }

    #[test]
    fn test_open_async_completes_on_settle() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.steps = Scenario::parse(
            r#"
[[steps]]
action = "open_async"
panel = "Toast"

[[steps]]
action = "open"
panel = "Inventory"

[[steps]]
action = "settle"
"#,
        )
        .unwrap()
        .steps;

        let mut runner = runner(&scenario);
        let lines = runner.run(&scenario.steps).unwrap();
        assert!(lines[0].ends_with("(loading)"));
        assert!(lines[2].contains("+Toast"));
        assert_eq!(runner.report(), "layer 0: Inventory* Toast*\n");
    }

    #[test]
    fn test_pending_loads_settle_at_end() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.steps = vec![Step::OpenAsync {
            panel: "Settings".to_string(),
            controller: None,
        }];
        let mut runner = runner(&scenario);
        let lines = runner.run(&scenario.steps).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("settle (end)"));
        assert_eq!(runner.report(), "layer 0: Settings*\n");
    }

    #[test]
    fn test_unavailable_and_undeclared() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.steps = vec![Step::Open {
            panel: "Broken".to_string(),
            controller: None,
        }];
        let mut runner = runner(&scenario);
        let lines = runner.run(&scenario.steps).unwrap();
        assert!(lines[0].ends_with("(unavailable)"));

        let ghost = vec![Step::Close {
            panel: "Ghost".to_string(),
        }];
        assert!(runner.run(&ghost).is_err());
    }

    #[test]
    fn test_open_async_of_undeclared_panel_fails() {
        let scenario =
            Scenario::parse("[[steps]]\naction = \"open_async\"\npanel = \"Ghost\"\n").unwrap();
        let mut runner = runner(&scenario);
        let err = runner.run(&scenario.steps).unwrap_err();

        assert!(format!("{:#}", err).contains("Step 1 (open_async Ghost) failed"));
        let cause = err.downcast_ref::<NavError>().unwrap();
        assert_eq!(
            cause,
            &NavError::MissingIdentityDeclaration {
                id: PanelId::new("Ghost")
            }
        );
    }

    #[test]
    fn test_async_bind_failure_fails_settle() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.steps = vec![
            Step::OpenAsync {
                panel: "Settings".to_string(),
                controller: Some("nope".to_string()),
            },
            Step::Settle,
        ];
        let mut runner = runner(&scenario);
        let err = runner.run(&scenario.steps).unwrap_err();

        assert!(format!("{:#}", err).contains("Step 2 (settle) failed"));
        assert!(matches!(
            err.downcast_ref::<NavError>(),
            Some(NavError::UnknownControllerKind { .. })
        ));
        assert!(runner.navigation().is_layer_empty(0));
    }

    #[test]
    fn test_async_failure_surfaces_at_end_settle() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.steps = vec![Step::OpenAsync {
            panel: "Settings".to_string(),
            controller: Some("nope".to_string()),
        }];
        let mut runner = runner(&scenario);
        let err = runner.run(&scenario.steps).unwrap_err();
        assert!(format!("{:#}", err).contains("Settling pending loads failed"));
    }

    #[test]
    fn test_duplicate_declarations_rejected() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.panels.push(scenario.panels[0].clone());
        assert!(Runner::new(&Config::default(), &scenario).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.missing, vec!["ui/broken"]);
    }
}
