use super::*;
use crate::config::Settings;
use crate::listener::{SaveDecision, SaveTriggerListener};
use crate::memory::MemoryHost;
use crate::platform::Platform;
use crate::runtime::MainLoop;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const ORIGINAL: &str = "<?php echo  'x';";
const FIXED: &str = "<?php echo 'x';\n";

struct Fixture {
    main: MainLoop<Session<MemoryHost>>,
    window: WindowId,
    view: ViewId,
}

fn fixture(settings: Settings) -> Fixture {
    let mut host = MemoryHost::new(Platform::Linux);
    let window = host.add_window(vec![PathBuf::from("/proj")]);
    let view = host.open_view(window, ORIGINAL, Some(PathBuf::from("/proj/index.php")));
    let fixer = Fixer::new(SettingsStore::in_memory(settings));
    let mut main = MainLoop::new(Session::new(host, fixer));
    let dispatcher = main.dispatcher();
    main.state_mut().host.forward_saves_to(dispatcher);
    Fixture { main, window, view }
}

fn context(f: &mut Fixture) -> RunContext {
    let token = f.main.state_mut().fixer.views_mut().begin_run(f.view);
    RunContext {
        window: f.window,
        view: f.view,
        snapshot: ORIGINAL.to_string(),
        file_hint: Some(PathBuf::from("/proj/index.php")),
        token,
    }
}

fn output(stdout: &str, exit_code: i32) -> Result<ProcessResult> {
    Ok(ProcessResult {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code,
    })
}

struct CountingNotifier(Arc<AtomicUsize>);

impl LintNotifier for CountingNotifier {
    fn notify_content_changed(&self, _view: ViewId, file: Option<&std::path::Path>) -> anyhow::Result<()> {
        assert_eq!(file, Some(std::path::Path::new("/proj/index.php")));
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BrokenNotifier;

impl LintNotifier for BrokenNotifier {
    fn notify_content_changed(&self, _view: ViewId, _file: Option<&std::path::Path>) -> anyhow::Result<()> {
        anyhow::bail!("linter integration is not installed")
    }
}

#[test]
fn test_identical_output_is_no_op() {
    let mut f = fixture(Settings::default());
    let ctx = context(&mut f);
    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(ORIGINAL, 0)));

    assert_eq!(outcome.kind(), OutcomeKind::NoChanges);
    let host = &f.main.state().host;
    assert_eq!(host.text(f.view), Some(ORIGINAL));
    assert_eq!(host.last_status(), Some(STATUS_NO_CHANGES));
}

#[test]
fn test_success_codes_replace_whole_buffer() {
    for exit_code in [0, 1] {
        let mut f = fixture(Settings::default());
        let ctx = context(&mut f);
        let outcome = f
            .main
            .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, exit_code)));

        let RunOutcome::Applied { diff } = outcome else {
            panic!("exit code {exit_code} should apply");
        };
        assert!(diff.contains("+<?php echo 'x';"));
        assert_eq!(f.main.state().host.text(f.view), Some(FIXED));
        assert_eq!(f.main.state().host.save_count(f.view), 0);
    }
}

#[test]
fn test_error_exit_suppresses_mutation() {
    let mut f = fixture(Settings::default());
    let ctx = context(&mut f);
    let result = Ok(ProcessResult {
        stdout: FIXED.to_string(),
        stderr: "ERROR: Referenced sniff \"Foo\" does not exist\n".to_string(),
        exit_code: 2,
    });
    let outcome = f.main.with_state(|s, d| s.reconcile(d, &ctx, result));

    assert!(matches!(
        outcome,
        RunOutcome::Failed(Error::FormatterReported { exit_code: 2, .. })
    ));
    let host = &f.main.state().host;
    assert_eq!(host.text(f.view), Some(ORIGINAL));
    assert_eq!(host.last_status(), Some(STATUS_ERROR));
    assert_eq!(
        host.console_log,
        vec!["--- PHP CBF Error ---\nERROR: Referenced sniff \"Foo\" does not exist".to_string()]
    );
    assert!(host.status_history.iter().all(|s| !s.contains("Referenced sniff")));
}

#[test]
fn test_spawn_and_encoding_failures_leave_buffer() {
    let failures = [
        Error::Spawn {
            program: "phpcbf".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        },
        Error::Encoding("Formatter stdout is not valid UTF-8".into()),
    ];
    for failure in failures {
        let mut f = fixture(Settings::default());
        let ctx = context(&mut f);
        let outcome = f.main.with_state(|s, d| s.reconcile(d, &ctx, Err(failure)));
        assert_eq!(outcome.kind(), OutcomeKind::Failed);
        assert_eq!(f.main.state().host.text(f.view), Some(ORIGINAL));
        assert_eq!(f.main.state().host.console_log.len(), 1);
    }
}

#[test]
fn test_fix_on_save_cycle_does_not_retrigger() {
    let settings = Settings {
        fix_on_save: true,
        ..Default::default()
    };
    let mut f = fixture(settings);
    let ctx = context(&mut f);
    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
    assert!(outcome.is_applied());
    assert!(f.main.state().fixer.views().is_saving(f.view));
    assert_eq!(f.main.state().host.save_count(f.view), 1);

    // Delivers the save event, which must only clear the flag
    f.main.run_until_idle();

    let session = f.main.state();
    assert!(!session.fixer.views().is_saving(f.view));
    assert_eq!(session.host.text(f.view), Some(FIXED));
    assert_eq!(session.host.save_count(f.view), 1);
    assert!(session.host.outcomes.is_empty(), "no second run expected");
}

#[test]
fn test_saving_flag_cleared_even_if_fix_on_save_disabled() {
    let mut f = fixture(Settings::default());
    let view = f.view;
    f.main.state_mut().fixer.views_mut().set_saving(view);

    let first = f
        .main
        .with_state(|s, d| SaveTriggerListener::on_post_save(s, d, view));
    let second = f
        .main
        .with_state(|s, d| SaveTriggerListener::on_post_save(s, d, view));

    assert_eq!(first, SaveDecision::OwnSave);
    assert_eq!(second, SaveDecision::Ignored);
    assert!(!f.main.state().fixer.views().is_saving(view));
}

#[test]
fn test_stale_run_does_not_mutate() {
    let mut f = fixture(Settings::default());
    let older = context(&mut f);
    let _newer = context(&mut f);

    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &older, output(FIXED, 1)));
    assert_eq!(outcome.kind(), OutcomeKind::Stale);
    assert_eq!(f.main.state().host.text(f.view), Some(ORIGINAL));
}

#[test]
fn test_closed_view_is_left_alone() {
    let mut f = fixture(Settings::default());
    let ctx = context(&mut f);
    let view = f.view;
    f.main.state_mut().host.close_view(view);

    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
    assert_eq!(outcome.kind(), OutcomeKind::ViewClosed);
}

#[test]
fn test_edits_during_wait_are_overwritten() {
    let mut f = fixture(Settings::default());
    let ctx = context(&mut f);
    let view = f.view;
    f.main.state_mut().host.edit(view, "<?php echo  'x'; // typing");

    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
    assert!(outcome.is_applied());
    assert_eq!(f.main.state().host.text(view), Some(FIXED));
}

#[test]
fn test_linter_notified_after_mutation() {
    let count = Arc::new(AtomicUsize::new(0));
    for fix_on_save in [false, true] {
        count.store(0, Ordering::SeqCst);
        let mut f = fixture(Settings {
            fix_on_save,
            ..Default::default()
        });
        f.main.state_mut().fixer = Fixer::new(SettingsStore::in_memory(Settings {
            fix_on_save,
            ..Default::default()
        }))
        .with_notifier(Box::new(CountingNotifier(Arc::clone(&count))));

        let ctx = context(&mut f);
        f.main
            .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
        f.main.run_until_idle();
        assert_eq!(count.load(Ordering::SeqCst), 1, "fix_on_save={fix_on_save}");
    }
}

#[test]
fn test_notification_failure_is_swallowed() {
    let mut f = fixture(Settings::default());
    f.main.state_mut().fixer =
        Fixer::new(SettingsStore::in_memory(Settings::default())).with_notifier(Box::new(BrokenNotifier));
    let ctx = context(&mut f);

    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
    assert!(outcome.is_applied());
    let host = &f.main.state().host;
    assert!(host.console_log.is_empty());
    assert_ne!(host.last_status(), Some(STATUS_ERROR));
}

#[test]
fn test_run_without_active_view() {
    let mut host = MemoryHost::new(Platform::Linux);
    let window = host.add_window(vec![]);
    let mut main = MainLoop::new(Session::new(
        host,
        Fixer::new(SettingsStore::in_memory(Settings::default())),
    ));
    let token = main.with_state(|s, d| s.run(d, window, STATUS_RUNNING));
    assert_eq!(token, None);
    main.run_until_idle();
    assert!(main.state().host.status_history.is_empty());
}

#[test]
fn test_run_with_missing_formatter_reports_error() {
    let mut f = fixture(Settings {
        phpcbf_path: Some("/definitely/not/here/phpcbf".into()),
        ..Default::default()
    });
    let window = f.window;
    let token = f.main.with_state(|s, d| s.run(d, window, STATUS_RUNNING));
    assert!(token.is_some());
    f.main.run_until_idle();

    let host = &f.main.state().host;
    assert_eq!(host.outcomes, vec![(f.view, OutcomeKind::Failed)]);
    assert_eq!(host.text(f.view), Some(ORIGINAL));
    assert!(host.status_history.iter().any(|s| s == "Running PHP CBF |"));
    // Animation cleared the line before the terse error message
    let n = host.status_history.len();
    assert_eq!(&host.status_history[n - 2..], &["".to_string(), STATUS_ERROR.to_string()]);
}

#[test]
fn test_fix_on_save_read_when_result_arrives() {
    let mut f = fixture(Settings::default());
    let ctx = context(&mut f);
    let view = f.view;
    // Enabled for this view while the formatter was still running
    f.main
        .state_mut()
        .host
        .set_view_settings(view, serde_json::json!({"PHP_CBF": {"fix_on_save": true}}));

    let outcome = f
        .main
        .with_state(|s, d| s.reconcile(d, &ctx, output(FIXED, 1)));
    assert!(outcome.is_applied());
    assert_eq!(f.main.state().host.save_count(view), 1);
    f.main.run_until_idle();
    assert!(!f.main.state().fixer.views().is_saving(view));
}

#[test]
fn test_ignored_save_lets_loop_go_idle() {
    let mut f = fixture(Settings::default());
    let view = f.view;
    // fix_on_save is off, so the forwarded save event is ignored
    f.main.with_state(|s, _| s.host.save(view)).unwrap();
    f.main.run_until_idle();

    let session = f.main.state();
    assert_eq!(session.host.save_count(view), 1);
    assert!(session.host.outcomes.is_empty());
}
