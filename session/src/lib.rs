//! Drawing session for inkcast.
//!
//! A [`DrawingSession`] is the single owner of one participant's canvas: the
//! ended strokes, the active set, the eraser index and the per-author
//! reassembly state. Producers on other threads hand it work through a
//! cloneable [`SessionHandle`]; the session drains the queue on its own
//! thread with [`DrawingSession::drain`] or [`DrawingSession::run`].
//!
//! Local strokes stream out through any [`wire::Transport`]. A local eraser
//! that touches no active ink is aborted instead of ended, so collaborators
//! never store it.

mod config;
mod error;
mod event;
mod session;

pub use config::SessionConfig;
pub use error::SessionClosed;
pub use event::{SessionEvent, SessionHandle, SessionNotice};
pub use session::{DrawingSession, LocalEnd, SessionStats, StrokeStyle};

#[cfg(test)]
mod tests {
    use super::*;
    use stroke::{AuthorId, BrushId, QuantizedPoint, Rgba, StrokeKey};
    use wire::LoopbackTransport;

    fn session() -> (DrawingSession<LoopbackTransport>, SessionHandle) {
        DrawingSession::new(
            SessionConfig::for_testing(AuthorId::new(1)),
            LoopbackTransport::new(),
        )
    }

    #[test]
    fn public_api_exports() {
        let _ = SessionConfig::default();
        let _ = SessionStats::default();
        let _ = StrokeStyle::eraser(4.0);
        let _ = SessionEvent::Shutdown;
        let _ = SessionClosed.to_string();
    }

    #[test]
    fn local_ink_commits_and_streams() {
        let (mut session, _handle) = session();
        let style = StrokeStyle::ink(BrushId::new(2), Rgba::BLACK, 6.0);
        let id = session.begin_stroke(style).unwrap();
        let points: Vec<_> = (0..40u16)
            .map(|i| QuantizedPoint::new(500 + i, 500, 90))
            .collect();
        session.push_points(id, &points).unwrap();
        let end = session.end_stroke(id).unwrap();

        let key = StrokeKey::new(AuthorId::new(1), id);
        assert_eq!(end, LocalEnd::Committed(key));
        assert_eq!(session.stroke(key).unwrap().points(), points.as_slice());
        assert!(session.transport().queued() > 3);
        assert!(!session.is_eraser_effective(key));
        assert_eq!(session.stats().completed, 1);
    }

    #[test]
    fn local_eraser_over_nothing_is_aborted() {
        let (mut session, _handle) = session();
        let id = session.begin_stroke(StrokeStyle::eraser(8.0)).unwrap();
        session
            .push_points(id, &[QuantizedPoint::new(10, 10, 255)])
            .unwrap();
        assert_eq!(session.end_stroke(id).unwrap(), LocalEnd::Discarded);
        assert_eq!(session.stats().discarded_erasers, 1);
        assert!(session.render_order().is_empty());

        let notices = session.take_notices();
        assert!(matches!(notices.as_slice(), [SessionNotice::EraserDiscarded(_)]));
    }

    #[test]
    fn push_to_unknown_stroke_fails() {
        let (mut session, _handle) = session();
        let missing = stroke::StrokeId::new(99);
        assert!(session.push_points(missing, &[]).is_err());
        assert!(session.end_stroke(missing).is_err());
    }

    #[test]
    fn drain_stops_at_shutdown() {
        let (mut session, handle) = session();
        handle.shutdown().unwrap();
        handle.deliver(AuthorId::new(2), vec![1, 2, 3]).unwrap();
        assert_eq!(session.drain(), 1);
        assert!(session.is_stopped());
        assert_eq!(session.stats().packets, 0);
    }

    #[test]
    fn handle_reports_closed_session() {
        let (session, handle) = session();
        drop(session);
        assert_eq!(handle.shutdown(), Err(SessionClosed));
    }
}
