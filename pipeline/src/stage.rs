use entity::Stage;

/// Whether a deal may move from `from` to `to`.
///
/// A deal can be closed at any point, so `won` and `lost` are reachable
/// from every stage. Any other move must be between adjacent stages in
/// the pipeline order, in either direction. Same-stage requests are
/// short-circuited by the engine before validation runs.
pub fn transition_allowed(from: Stage, to: Stage) -> bool {
    if to.is_terminal() {
        return true;
    }
    from.position().abs_diff(to.position()) <= 1
}
