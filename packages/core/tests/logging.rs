//! Smoke test for the `tracing` spans/events `SPEC_FULL.md` §2/G calls for
//! around render entry points and match/mismatch decisions.
//!
//! Installs a scoped `tracing_subscriber::fmt` subscriber (via
//! `tracing::subscriber::set_default`, not the process-global default, so
//! this test doesn't clobber other tests' subscribers) writing to an
//! in-memory buffer, runs a render, and checks the expected span/event names
//! actually made it out — not just that `render` happens to compile against
//! `tracing`'s macros.

use live_render_core::prelude::*;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

struct NoModules;
impl ComponentModules for NoModules {
    fn instantiate(&self, _module: &str) -> Result<Box<dyn ComponentHost>, DiffError> {
        unreachable!("no components referenced in this test")
    }
}

#[test]
fn render_emits_tracing_spans_and_events() {
    let buf = SharedBuf::default();
    let make_writer = {
        let buf = buf.clone();
        move || buf.clone()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(make_writer)
        .with_ansi(false)
        .with_level(false)
        .without_time()
        .finish();

    let statics = vec!["<p>".to_string(), "</p>".to_string()];
    let fp = live_render_core::diff::compute_fingerprint(&statics);
    let root = TemplateInstance::new(fp, statics, vec![Node::Leaf(Some("hi".into()))]).unwrap();

    let _ = tracing::subscriber::with_default(subscriber, || {
        render(Session::new(), &root, &NoModules).unwrap()
    });

    let logged = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    assert!(
        logged.contains("render"),
        "expected the render entry-point span in the captured log, got: {logged:?}"
    );
    assert!(
        logged.contains("diff_template"),
        "expected the diff_template trace event in the captured log, got: {logged:?}"
    );
}
