// Session supervisor - owns the surface lifecycle and the rotation/health loop
use crate::application::surface::{RenderedSurface, SurfaceAction, SurfaceError, SurfaceFactory};
use crate::domain::dashboard::DashboardSpec;
use crate::domain::health::{self, HealthVerdict};
use crate::domain::rotation;
use crate::infrastructure::config::KioskConfig;
use crate::infrastructure::event_log::EventLog;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;

/// How the run ended. Mapped to the process exit code in `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Operator interrupt; the kiosk was shut down on purpose.
    OperatorShutdown,
    /// Consecutive recovery cycles exceeded `max_retries`.
    RetriesExhausted,
}

/// The supervisor phases. Exactly one is live at a time; phases never
/// overlap and every transition is appended to the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LoggedOut,
    LoggingIn,
    Active,
    Recovering,
    Terminated(RunOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryDecision {
    Retry,
    GiveUp,
}

/// The only state that survives across loop iterations.
pub struct SessionState {
    pub current_dashboard_url: Option<String>,
    pub last_healthy_at: NaiveDateTime,
    pub consecutive_failures: u32,
    /// Bumped on every surface recreation; a handle from an older epoch is
    /// gone for good and must never be touched again.
    pub browser_epoch: u64,
}

pub struct SessionSupervisor {
    config: Arc<KioskConfig>,
    dashboards: Vec<DashboardSpec>,
    factory: Arc<dyn SurfaceFactory>,
    events: EventLog,
    state: SessionState,
    last_cleanup_at: NaiveDateTime,
}

impl SessionSupervisor {
    pub fn new(config: Arc<KioskConfig>, factory: Arc<dyn SurfaceFactory>, events: EventLog) -> Self {
        let now = Local::now().naive_local();
        let dashboards = config.dashboard_specs();
        Self {
            config,
            dashboards,
            factory,
            events,
            state: SessionState {
                current_dashboard_url: None,
                last_healthy_at: now,
                consecutive_failures: 0,
                browser_epoch: 0,
            },
            last_cleanup_at: now,
        }
    }

    /// Drive the state machine until shutdown or retry exhaustion. The
    /// surface is released on every exit path; interrupts are only honored
    /// at tick and backoff boundaries so in-flight UI work can finish.
    pub async fn run(&mut self) -> RunOutcome {
        let mut surface: Option<Box<dyn RenderedSurface>> = None;
        let mut phase = Phase::LoggedOut;

        let outcome = loop {
            phase = match phase {
                Phase::LoggedOut => self.acquire_surface(&mut surface).await,
                Phase::LoggingIn => match surface.as_deref_mut() {
                    Some(live) => self.log_in(live).await,
                    None => Phase::LoggedOut,
                },
                Phase::Active => match surface.as_deref_mut() {
                    Some(live) => {
                        // Tick first, sleep after: a fresh login must put a
                        // dashboard up right away, not a check interval later.
                        match self.tick(live, Local::now().naive_local()).await {
                            Phase::Active => {
                                tokio::select! {
                                    _ = tokio::signal::ctrl_c() => {
                                        self.events.record("interrupted", "operator shutdown");
                                        Phase::Terminated(RunOutcome::OperatorShutdown)
                                    }
                                    _ = tokio::time::sleep(self.check_interval()) => Phase::Active,
                                }
                            }
                            next => next,
                        }
                    }
                    None => Phase::LoggedOut,
                },
                Phase::Recovering => match self.begin_recovery() {
                    RecoveryDecision::GiveUp => Phase::Terminated(RunOutcome::RetriesExhausted),
                    RecoveryDecision::Retry => {
                        tokio::select! {
                            _ = tokio::signal::ctrl_c() => {
                                self.events.record("interrupted", "operator shutdown");
                                Phase::Terminated(RunOutcome::OperatorShutdown)
                            }
                            _ = tokio::time::sleep(self.backoff()) => Phase::LoggedOut,
                        }
                    }
                },
                Phase::Terminated(outcome) => break outcome,
            };
        };

        if let Some(mut live) = surface.take() {
            live.teardown().await;
        }
        self.events.record("terminated", &format!("{outcome:?}"));
        outcome
    }

    /// `LoggedOut`: tear down whatever handle is left and create a fresh
    /// surface under a new epoch.
    async fn acquire_surface(&mut self, surface: &mut Option<Box<dyn RenderedSurface>>) -> Phase {
        if let Some(mut old) = surface.take() {
            old.teardown().await;
        }
        match self.factory.create().await {
            Ok(fresh) => {
                self.state.browser_epoch += 1;
                self.events
                    .record("surface_created", &format!("epoch {}", self.state.browser_epoch));
                *surface = Some(fresh);
                Phase::LoggingIn
            }
            Err(e) => {
                self.events.record("surface_create_failed", &e.to_string());
                Phase::Recovering
            }
        }
    }

    /// `LoggingIn`: open the portal and authenticate. Success clears the
    /// current dashboard so the first Active tick performs a switch.
    async fn log_in(&mut self, surface: &mut dyn RenderedSurface) -> Phase {
        self.events.record("logging_in", &self.config.portal.base_url);

        if let Err(e) = surface.open(&self.config.portal.base_url).await {
            self.events.record("login_failed", &e.to_string());
            return Phase::Recovering;
        }
        match surface
            .login(&self.config.portal.username, &self.config.portal.password)
            .await
        {
            Ok(()) => {
                self.state.current_dashboard_url = None;
                self.events.record("login_succeeded", "");
                Phase::Active
            }
            Err(e) => {
                self.events.record("login_failed", &e.to_string());
                Phase::Recovering
            }
        }
    }

    /// One `Active` tick: rotation first, then health, strictly in that
    /// order, then cosmetic housekeeping.
    async fn tick(&mut self, surface: &mut dyn RenderedSurface, now: NaiveDateTime) -> Phase {
        let target = rotation::select_dashboard(
            now.time(),
            &self.dashboards,
            self.config.rotation.switch_interval_minutes,
        )
        .clone();

        let next = if self.state.current_dashboard_url.as_deref() != Some(target.url.as_str()) {
            match self.switch_to(surface, &target, now).await {
                Ok(()) => Phase::Active,
                Err(e) => {
                    self.events.record("switch_failed", &e.to_string());
                    Phase::Recovering
                }
            }
        } else {
            self.check_health(surface, &target, now).await
        };

        if next == Phase::Active {
            self.housekeeping(surface, now).await;
        }
        next
    }

    /// Navigate to the target and apply the display steps. Navigation
    /// failure abandons the switch into recovery; the cosmetic steps are
    /// each best-effort, a missed one never costs a browser restart.
    async fn switch_to(
        &mut self,
        surface: &mut dyn RenderedSurface,
        target: &DashboardSpec,
        now: NaiveDateTime,
    ) -> Result<(), SurfaceError> {
        self.events
            .record("switching", &format!("'{}' -> {}", target.title, target.url));
        surface.open(&target.url).await?;

        for action in [
            SurfaceAction::EnterFullscreen,
            SurfaceAction::SetAutoRefresh(self.config.rotation.refresh_interval_minutes),
            SurfaceAction::CollapseFilters,
            SurfaceAction::ClearTooltips,
        ] {
            if let Err(e) = surface.perform(action).await {
                tracing::warn!(%action, error = %e, "cosmetic step skipped");
                self.events
                    .record("cosmetic_step_skipped", &format!("{action}: {e}"));
            }
        }

        self.state.current_dashboard_url = Some(target.url.clone());
        self.state.last_healthy_at = now;
        self.state.consecutive_failures = 0;
        self.events.record("switched", &target.url);
        Ok(())
    }

    /// Judge the surface that has been showing since the last switch.
    async fn check_health(
        &mut self,
        surface: &mut dyn RenderedSurface,
        expected: &DashboardSpec,
        now: NaiveDateTime,
    ) -> Phase {
        let observed_title = match surface.current_title().await {
            Ok(title) => title,
            Err(e) => {
                self.events.record("health_check_failed", &e.to_string());
                return Phase::Recovering;
            }
        };

        match health::evaluate(
            self.state.last_healthy_at,
            now,
            self.config.rotation.refresh_interval_minutes,
            self.config.rotation.stale_tolerance_minutes,
            &expected.title,
            &observed_title,
        ) {
            HealthVerdict::Healthy => {
                self.state.last_healthy_at = now;
                self.state.consecutive_failures = 0;
                self.events.record("health_verdict", "healthy");
                Phase::Active
            }
            HealthVerdict::Stale(reason) => {
                self.events.record("health_verdict", &format!("stale: {reason}"));
                Phase::Recovering
            }
            HealthVerdict::Unreachable(reason) => {
                self.events
                    .record("health_verdict", &format!("unreachable: {reason}"));
                Phase::Recovering
            }
        }
    }

    /// Periodic best-effort pass that dismisses hover popovers left behind
    /// on a display nobody is touching.
    async fn housekeeping(&mut self, surface: &mut dyn RenderedSurface, now: NaiveDateTime) {
        let due = i64::from(self.config.rotation.cleanup_interval_minutes) * 60;
        if (now - self.last_cleanup_at).num_seconds() <= due {
            return;
        }
        self.last_cleanup_at = now;
        match surface.perform(SurfaceAction::ClearTooltips).await {
            Ok(()) => self.events.record("housekeeping", "cleared tooltips"),
            Err(e) => self.events.record("housekeeping", &format!("skipped: {e}")),
        }
    }

    /// `Recovering`: bump the failure counter and decide between another
    /// teardown-and-relogin cycle and giving up. The counter only resets on
    /// a successful switch or health check, so faults that recur before the
    /// session proves itself keep accumulating toward the ceiling.
    fn begin_recovery(&mut self) -> RecoveryDecision {
        self.state.consecutive_failures += 1;
        self.events.record(
            "recovering",
            &format!(
                "failure {} of {} allowed",
                self.state.consecutive_failures, self.config.rotation.max_retries
            ),
        );
        if self.state.consecutive_failures > self.config.rotation.max_retries {
            self.events.record("retries_exhausted", "");
            RecoveryDecision::GiveUp
        } else {
            RecoveryDecision::Retry
        }
    }

    fn check_interval(&self) -> Duration {
        Duration::from_secs(self.config.rotation.check_interval_seconds)
    }

    fn backoff(&self) -> Duration {
        Duration::from_secs(self.config.rotation.backoff_seconds)
    }

    #[cfg(test)]
    fn state(&self) -> &SessionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{
        DashboardEntry, PortalSettings, RotationSettings, SurfaceSettings,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn test_config(max_retries: u32) -> Arc<KioskConfig> {
        test_config_with(max_retries, 0)
    }

    fn test_config_with(max_retries: u32, check_interval_seconds: u64) -> Arc<KioskConfig> {
        Arc::new(KioskConfig {
            portal: PortalSettings {
                base_url: "https://portal.example.org/login/".to_string(),
                username: "kiosk".to_string(),
                password: "secret".to_string(),
            },
            dashboards: vec![
                DashboardEntry {
                    title: "A".to_string(),
                    url: "u1".to_string(),
                },
                DashboardEntry {
                    title: "B".to_string(),
                    url: "u2".to_string(),
                },
            ],
            rotation: RotationSettings {
                max_retries,
                backoff_seconds: 0,
                check_interval_seconds,
                ..RotationSettings::default()
            },
            surface: SurfaceSettings::default(),
            event_log: String::new(),
        })
    }

    fn test_events() -> (EventLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().join("events.jsonl")).unwrap();
        (log, dir)
    }

    #[derive(Default)]
    struct Script {
        fail_open: bool,
        /// Let the login page load but refuse dashboard navigations.
        fail_dashboard_open: bool,
        fail_login: bool,
        fail_title: bool,
        transient_actions: bool,
        title: String,
    }

    /// In-memory surface that records every call it receives.
    struct FakeSurface {
        script: Arc<Script>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSurface {
        fn new(script: Script) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    script: Arc::new(script),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl RenderedSurface for FakeSurface {
        async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
            self.calls.lock().unwrap().push(format!("open {url}"));
            let refused = self.script.fail_open
                || (self.script.fail_dashboard_open && !url.contains("login"));
            if refused {
                Err(SurfaceError::Fault("navigation refused".to_string()))
            } else {
                Ok(())
            }
        }

        async fn login(&mut self, username: &str, _password: &str) -> Result<(), SurfaceError> {
            self.calls.lock().unwrap().push(format!("login {username}"));
            if self.script.fail_login {
                Err(SurfaceError::Fault("bad credentials".to_string()))
            } else {
                Ok(())
            }
        }

        async fn current_title(&mut self) -> Result<String, SurfaceError> {
            self.calls.lock().unwrap().push("title".to_string());
            if self.script.fail_title {
                Err(SurfaceError::Fault("session gone".to_string()))
            } else {
                Ok(self.script.title.clone())
            }
        }

        async fn perform(&mut self, action: SurfaceAction) -> Result<(), SurfaceError> {
            self.calls.lock().unwrap().push(format!("perform {action}"));
            if self.script.transient_actions {
                Err(SurfaceError::Transient("element not found".to_string()))
            } else {
                Ok(())
            }
        }

        async fn teardown(&mut self) {
            self.calls.lock().unwrap().push("teardown".to_string());
        }
    }

    struct FakeFactory {
        script: fn() -> Script,
        created: Arc<Mutex<u32>>,
        /// Shared journal; every surface this factory hands out records into it.
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFactory {
        fn new(script: fn() -> Script) -> Self {
            Self {
                script,
                created: Arc::new(Mutex::new(0)),
                journal: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl SurfaceFactory for FakeFactory {
        async fn create(&self) -> Result<Box<dyn RenderedSurface>, SurfaceError> {
            *self.created.lock().unwrap() += 1;
            let surface = FakeSurface {
                script: Arc::new((self.script)()),
                calls: self.journal.clone(),
            };
            Ok(Box::new(surface))
        }
    }

    fn supervisor(max_retries: u32) -> (SessionSupervisor, tempfile::TempDir) {
        let (events, dir) = test_events();
        let sup = SessionSupervisor::new(
            test_config(max_retries),
            Arc::new(FakeFactory::new(Script::default)),
            events,
        );
        (sup, dir)
    }

    #[tokio::test]
    async fn test_first_tick_switches_to_slot_dashboard() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, calls) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        // 00:07 is slot 0 with 15-minute slots, so dashboard A.
        let phase = sup.tick(&mut surface, at(0, 7)).await;

        assert_eq!(phase, Phase::Active);
        assert_eq!(sup.state().current_dashboard_url.as_deref(), Some("u1"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], "open u1");
        assert!(calls.iter().any(|c| c == "perform enter fullscreen"));
    }

    #[tokio::test]
    async fn test_same_slot_does_not_renavigate() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, calls) = FakeSurface::new(Script {
            title: "A - Superset".to_string(),
            ..Script::default()
        });

        sup.tick(&mut surface, at(0, 7)).await;
        sup.tick(&mut surface, at(0, 8)).await;

        let calls = calls.lock().unwrap();
        let opens = calls.iter().filter(|c| c.starts_with("open")).count();
        assert_eq!(opens, 1);
        // The second tick fell through to a health check instead.
        assert!(calls.iter().any(|c| c == "title"));
    }

    #[tokio::test]
    async fn test_slot_change_triggers_switch() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, calls) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        sup.tick(&mut surface, at(0, 7)).await;
        sup.tick(&mut surface, at(0, 16)).await;

        assert_eq!(sup.state().current_dashboard_url.as_deref(), Some("u2"));
        let calls = calls.lock().unwrap();
        assert!(calls.iter().any(|c| c == "open u2"));
    }

    #[tokio::test]
    async fn test_cosmetic_failures_do_not_abort_switch() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            title: "A".to_string(),
            transient_actions: true,
            ..Script::default()
        });

        let phase = sup.tick(&mut surface, at(0, 7)).await;

        assert_eq!(phase, Phase::Active);
        assert_eq!(sup.state().current_dashboard_url.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_navigation_fault_enters_recovery() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            fail_open: true,
            ..Script::default()
        });

        let phase = sup.tick(&mut surface, at(0, 7)).await;

        assert_eq!(phase, Phase::Recovering);
        assert_eq!(sup.state().consecutive_failures, 0);
        assert_eq!(sup.begin_recovery(), RecoveryDecision::Retry);
        assert_eq!(sup.state().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_stale_surface_enters_recovery() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        sup.tick(&mut surface, at(0, 7)).await;
        // Refresh 5 + tolerance 1: nothing healthy observed for 7 minutes.
        let phase = sup.tick(&mut surface, at(0, 14)).await;

        assert_eq!(phase, Phase::Recovering);
    }

    #[tokio::test]
    async fn test_wrong_title_enters_recovery() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            title: "Login - Superset".to_string(),
            ..Script::default()
        });

        sup.tick(&mut surface, at(0, 7)).await;
        let phase = sup.tick(&mut surface, at(0, 9)).await;

        assert_eq!(phase, Phase::Recovering);
    }

    #[tokio::test]
    async fn test_title_fetch_fault_enters_recovery() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            fail_title: true,
            ..Script::default()
        });

        sup.state.current_dashboard_url = Some("u1".to_string());
        sup.state.last_healthy_at = at(0, 6);
        let phase = sup.tick(&mut surface, at(0, 7)).await;

        assert_eq!(phase, Phase::Recovering);
    }

    #[tokio::test]
    async fn test_healthy_tick_resets_failure_counter() {
        let (mut sup, _dir) = supervisor(10);
        let (mut surface, _) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        sup.state.consecutive_failures = 3;
        sup.tick(&mut surface, at(0, 7)).await;

        assert_eq!(sup.state().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_two_consecutive_faults_exhaust_single_retry() {
        // Scenario: max_retries = 1 and the fault recurs before any tick
        // succeeds. The second recovery entry must give up.
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            fail_open: true,
            ..Script::default()
        });

        assert_eq!(sup.tick(&mut surface, at(0, 7)).await, Phase::Recovering);
        assert_eq!(sup.begin_recovery(), RecoveryDecision::Retry);

        assert_eq!(sup.tick(&mut surface, at(0, 8)).await, Phase::Recovering);
        assert_eq!(sup.begin_recovery(), RecoveryDecision::GiveUp);
        assert_eq!(sup.state().consecutive_failures, 2);
    }

    #[tokio::test]
    async fn test_login_success_forces_fresh_switch() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, calls) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        sup.state.current_dashboard_url = Some("u1".to_string());
        let phase = sup.log_in(&mut surface).await;

        assert_eq!(phase, Phase::Active);
        assert_eq!(sup.state().current_dashboard_url, None);
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], "open https://portal.example.org/login/");
        assert_eq!(calls[1], "login kiosk");
    }

    #[tokio::test]
    async fn test_login_failure_enters_recovery() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, _) = FakeSurface::new(Script {
            fail_login: true,
            ..Script::default()
        });

        assert_eq!(sup.log_in(&mut surface).await, Phase::Recovering);
    }

    #[tokio::test]
    async fn test_housekeeping_runs_after_cleanup_interval() {
        let (mut sup, _dir) = supervisor(1);
        let (mut surface, calls) = FakeSurface::new(Script {
            title: "A".to_string(),
            ..Script::default()
        });

        sup.last_cleanup_at = at(0, 0);
        sup.tick(&mut surface, at(0, 7)).await;
        {
            let calls = calls.lock().unwrap();
            // 7 minutes in: not due yet (default interval is 30 minutes);
            // only the switch sequence's own tooltip clear has run.
            let clears = calls.iter().filter(|c| *c == "perform clear tooltips").count();
            assert_eq!(clears, 1);
        }

        // Keep the health check green so the tick stays Active.
        sup.state.last_healthy_at = at(0, 36);
        sup.tick(&mut surface, at(0, 37)).await;
        let calls = calls.lock().unwrap();
        let clears = calls.iter().filter(|c| *c == "perform clear tooltips").count();
        assert_eq!(clears, 2);
        assert_eq!(sup.last_cleanup_at, at(0, 37));
    }

    #[tokio::test]
    async fn test_acquire_surface_bumps_epoch_and_tears_down_old() {
        let (mut sup, _dir) = supervisor(1);
        let factory = FakeFactory::new(Script::default);
        let created = factory.created.clone();
        sup.factory = Arc::new(factory);

        let (old, old_calls) = FakeSurface::new(Script::default());
        let mut slot: Option<Box<dyn RenderedSurface>> = Some(Box::new(old));

        let phase = sup.acquire_surface(&mut slot).await;

        assert_eq!(phase, Phase::LoggingIn);
        assert_eq!(sup.state().browser_epoch, 1);
        assert_eq!(*created.lock().unwrap(), 1);
        assert!(old_calls.lock().unwrap().contains(&"teardown".to_string()));
    }

    #[tokio::test]
    async fn test_first_tick_runs_before_any_sleep() {
        // The check interval is an hour; if Active slept before its first
        // tick the dashboard open below would never be reached. Navigation
        // faults so the run terminates after that first attempt.
        let (events, _dir) = test_events();
        let factory = FakeFactory::new(|| Script {
            fail_dashboard_open: true,
            ..Script::default()
        });
        let journal = factory.journal.clone();
        let mut sup = SessionSupervisor::new(
            test_config_with(0, 3600),
            Arc::new(factory),
            events,
        );

        let outcome = sup.run().await;

        assert_eq!(outcome, RunOutcome::RetriesExhausted);
        let journal = journal.lock().unwrap();
        // Login page opens and login succeeds; the fake only refuses the
        // dashboard navigation that must follow immediately.
        assert_eq!(journal[0], "open https://portal.example.org/login/");
        assert_eq!(journal[1], "login kiosk");
        assert!(journal[2].starts_with("open u"));
    }

    #[tokio::test]
    async fn test_run_gives_up_after_exhausted_logins() {
        // End-to-end through run(): every session fails login, max_retries
        // is 1, backoff and check interval are zero.
        let (events, _dir) = test_events();
        let mut sup = SessionSupervisor::new(
            test_config(1),
            Arc::new(FakeFactory::new(|| Script {
                fail_login: true,
                ..Script::default()
            })),
            events,
        );

        let outcome = sup.run().await;

        assert_eq!(outcome, RunOutcome::RetriesExhausted);
        assert_eq!(sup.state().consecutive_failures, 2);
        assert_eq!(sup.state().browser_epoch, 2);
    }
}
