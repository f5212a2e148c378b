//! Lifecycle state machine for bubbles.
//!
//! ```text
//! Active ──pop──▶ AnimatingPop ───▶ Destroyed
//!    │                                 ▲
//!    └──merge─▶ AnimatingMerge ────────┘
//! ```
//!
//! A bubble leaves `Active` only through [`Lifecycle::begin_pop`] or
//! [`Lifecycle::begin_merge`]. Both refuse (return `false`) unless the
//! bubble is `Active` and not invulnerable; that refusal is the re-entrancy
//! guard that keeps a bubble from being popped or merged twice. Accepted
//! transitions always run to completion.
//!
//! Multi-tick animations are carried here as a [`BubbleAnimation`] and
//! advanced once per tick by the lifecycle systems in
//! [`crate::systems::lifecycle`].

use bevy_ecs::prelude::{Component, Entity};

use crate::components::bubble::Bubble;
use crate::resources::variants::VariantRule;

/// Discrete lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Active,
    AnimatingMerge,
    AnimatingPop,
    Destroyed,
}

/// Why a pop was requested. Only [`PopCause::Click`] changes bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopCause {
    /// Two overlapping bubbles triggered it.
    Contact,
    /// Scheduled by a neighbouring pop.
    Chain,
    /// Grew past `pop_at_size` or shrank below `pop_below_size`.
    Growth,
    /// Clicked by the player.
    Click,
    /// Evicted to make room for a spawn.
    Evict,
    /// Requested from outside the engine.
    External,
}

/// Linear size interpolation over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeTween {
    pub from: f32,
    pub to: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl SizeTween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Advance by `dt` seconds and return the interpolated size.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.current()
    }

    pub fn current(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Time-extended size change carried by an animating bubble.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BubbleAnimation {
    #[default]
    None,
    /// Inflate before popping.
    GrowTo(SizeTween),
    /// Deflate before merging.
    ShrinkTo(SizeTween),
}

/// The other half of a merge in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLink {
    pub partner: Entity,
    /// The leader completes the merge; the follower only animates.
    pub leader: bool,
}

/// Result of advancing an animation by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStep {
    /// New diameter, when the animation changes it.
    pub size: Option<f32>,
    /// The animated transition is ready to complete.
    pub finished: bool,
}

/// Per-bubble lifecycle state.
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct Lifecycle {
    state: LifecycleState,
    animation: BubbleAnimation,
    initial_size: f32,
    merge: Option<MergeLink>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn animation(&self) -> BubbleAnimation {
        self.animation
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    pub fn is_animating(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::AnimatingPop | LifecycleState::AnimatingMerge
        )
    }

    /// Popping or already gone.
    pub fn is_popped(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::AnimatingPop | LifecycleState::Destroyed
        )
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    /// Diameter when the current transition started.
    pub fn initial_size(&self) -> f32 {
        self.initial_size
    }

    pub fn merge_link(&self) -> Option<MergeLink> {
        self.merge
    }

    /// The guard shared by pop and merge.
    pub fn accepts_transition(&self, bubble: &Bubble) -> bool {
        self.state == LifecycleState::Active && !bubble.invulnerable
    }

    /// Enter `AnimatingPop`. Returns `false` when the bubble is already
    /// popped, invulnerable or animating; nothing changes in that case.
    pub fn begin_pop(&mut self, bubble: &Bubble, rule: &VariantRule) -> bool {
        if !self.accepts_transition(bubble) {
            return false;
        }
        self.state = LifecycleState::AnimatingPop;
        self.initial_size = bubble.size();
        self.animation = if rule.pop_delay > 0.0 {
            BubbleAnimation::GrowTo(SizeTween::new(
                bubble.size(),
                bubble.size() * rule.pop_size_increase,
                rule.pop_delay,
            ))
        } else {
            BubbleAnimation::None
        };
        true
    }

    /// Enter `AnimatingMerge` linked to `partner`.
    ///
    /// Callers must check [`merge_allowed`] for both sides first so that a
    /// pair is either fully accepted or left untouched.
    pub fn begin_merge(
        &mut self,
        bubble: &Bubble,
        partner: Entity,
        leader: bool,
        rule: &VariantRule,
    ) -> bool {
        if !self.accepts_transition(bubble) {
            return false;
        }
        self.state = LifecycleState::AnimatingMerge;
        self.initial_size = bubble.size();
        self.merge = Some(MergeLink { partner, leader });
        self.animation = if rule.merge_delay > 0.0 {
            BubbleAnimation::ShrinkTo(SizeTween::new(
                bubble.size(),
                bubble.size() * rule.merge_size_shrink,
                rule.merge_delay,
            ))
        } else {
            BubbleAnimation::None
        };
        true
    }

    /// Advance the running animation. Non-animating bubbles never finish.
    pub fn advance(&mut self, dt: f32) -> AnimationStep {
        if !self.is_animating() {
            return AnimationStep {
                size: None,
                finished: false,
            };
        }
        match &mut self.animation {
            BubbleAnimation::None => AnimationStep {
                size: None,
                finished: true,
            },
            BubbleAnimation::GrowTo(tween) | BubbleAnimation::ShrinkTo(tween) => {
                let size = tween.advance(dt);
                AnimationStep {
                    size: Some(size),
                    finished: tween.is_finished(),
                }
            }
        }
    }

    /// Terminal transition. Returns `false` if it already happened.
    pub fn mark_destroyed(&mut self) -> bool {
        if self.state == LifecycleState::Destroyed {
            return false;
        }
        self.state = LifecycleState::Destroyed;
        self.animation = BubbleAnimation::None;
        self.merge = None;
        true
    }

    /// Drop an unfinished transition and return to `Active`.
    ///
    /// Used when the other half of a merge disappeared. Returns the diameter
    /// the bubble had when the transition started.
    pub fn release(&mut self) -> f32 {
        if self.is_animating() {
            self.state = LifecycleState::Active;
        }
        self.animation = BubbleAnimation::None;
        self.merge = None;
        self.initial_size
    }
}

/// Both halves of a merge must pass the guard before either is touched.
pub fn merge_allowed(a: (&Lifecycle, &Bubble), b: (&Lifecycle, &Bubble)) -> bool {
    a.0.accepts_transition(a.1) && b.0.accepts_transition(b.1)
}

/// Countdown to a chain-reaction pop scheduled by a neighbour.
///
/// When `remaining` reaches zero the chain pop system submits a pop request
/// with [`PopCause::Chain`] and removes the component.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingPop {
    /// Seconds until the pop is requested.
    pub remaining: f32,
}

impl PendingPop {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn rule() -> VariantRule {
        VariantRule {
            pop_delay: 0.2,
            pop_size_increase: 1.5,
            merge_delay: 0.4,
            merge_size_shrink: 0.5,
            ..VariantRule::default()
        }
    }

    #[test]
    fn test_new_is_active() {
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), LifecycleState::Active);
        assert!(!lc.is_animating());
        assert!(!lc.is_popped());
    }

    #[test]
    fn test_begin_pop_accepts_once() {
        let bubble = Bubble::new(2.0, 0);
        let mut lc = Lifecycle::new();
        assert!(lc.begin_pop(&bubble, &rule()));
        assert_eq!(lc.state(), LifecycleState::AnimatingPop);
        assert!(approx_eq(lc.initial_size(), 2.0));

        let snapshot = lc.clone();
        assert!(!lc.begin_pop(&bubble, &rule()));
        assert_eq!(lc, snapshot);
    }

    #[test]
    fn test_begin_pop_rejects_invulnerable() {
        let bubble = Bubble::new(2.0, 0).with_invulnerable(true);
        let mut lc = Lifecycle::new();
        assert!(!lc.begin_pop(&bubble, &rule()));
        assert_eq!(lc, Lifecycle::new());
    }

    #[test]
    fn test_begin_pop_rejects_merging() {
        let bubble = Bubble::new(2.0, 0);
        let mut lc = Lifecycle::new();
        assert!(lc.begin_merge(&bubble, Entity::PLACEHOLDER, true, &rule()));
        assert!(!lc.begin_pop(&bubble, &rule()));
        assert_eq!(lc.state(), LifecycleState::AnimatingMerge);
    }

    #[test]
    fn test_pop_grow_animation() {
        let bubble = Bubble::new(2.0, 0);
        let mut lc = Lifecycle::new();
        lc.begin_pop(&bubble, &rule());

        let step = lc.advance(0.1);
        assert!(approx_eq(step.size.unwrap(), 2.5));
        assert!(!step.finished);

        let step = lc.advance(0.1);
        assert!(approx_eq(step.size.unwrap(), 3.0));
        assert!(step.finished);
    }

    #[test]
    fn test_pop_without_delay_finishes_immediately() {
        let bubble = Bubble::new(2.0, 0);
        let rule = VariantRule {
            pop_delay: 0.0,
            ..VariantRule::default()
        };
        let mut lc = Lifecycle::new();
        lc.begin_pop(&bubble, &rule);
        assert_eq!(lc.animation(), BubbleAnimation::None);
        let step = lc.advance(0.016);
        assert!(step.size.is_none());
        assert!(step.finished);
    }

    #[test]
    fn test_merge_shrink_animation() {
        let bubble = Bubble::new(2.0, 0);
        let mut lc = Lifecycle::new();
        assert!(lc.begin_merge(&bubble, Entity::PLACEHOLDER, false, &rule()));
        let link = lc.merge_link().unwrap();
        assert!(!link.leader);

        let step = lc.advance(0.2);
        assert!(approx_eq(step.size.unwrap(), 1.5));
        let step = lc.advance(0.5);
        assert!(approx_eq(step.size.unwrap(), 1.0));
        assert!(step.finished);
    }

    #[test]
    fn test_merge_allowed_requires_both() {
        let a = Bubble::new(1.0, 0);
        let b = Bubble::new(1.0, 0).with_invulnerable(true);
        let la = Lifecycle::new();
        let lb = Lifecycle::new();
        assert!(!merge_allowed((&la, &a), (&lb, &b)));
        let c = Bubble::new(1.0, 0);
        assert!(merge_allowed((&la, &a), (&lb, &c)));
    }

    #[test]
    fn test_advance_idle_never_finishes() {
        let mut lc = Lifecycle::new();
        let step = lc.advance(10.0);
        assert!(!step.finished);
        assert!(step.size.is_none());
    }

    #[test]
    fn test_mark_destroyed_once() {
        let bubble = Bubble::new(1.0, 0);
        let mut lc = Lifecycle::new();
        lc.begin_pop(&bubble, &rule());
        assert!(lc.mark_destroyed());
        assert!(!lc.mark_destroyed());
        assert!(lc.is_popped());
        assert!(!lc.begin_pop(&bubble, &rule()));
    }

    #[test]
    fn test_release_returns_to_active() {
        let bubble = Bubble::new(1.4, 0);
        let mut lc = Lifecycle::new();
        lc.begin_merge(&bubble, Entity::PLACEHOLDER, true, &rule());
        lc.advance(0.1);
        let original = lc.release();
        assert!(approx_eq(original, 1.4));
        assert!(lc.is_active());
        assert!(lc.merge_link().is_none());
    }

    #[test]
    fn test_size_tween_zero_duration() {
        let mut tween = SizeTween::new(1.0, 3.0, 0.0);
        assert!(tween.is_finished());
        assert!(approx_eq(tween.advance(0.1), 3.0));
    }

    #[test]
    fn test_pending_pop_clamps_negative() {
        assert_eq!(PendingPop::new(-1.0).remaining, 0.0);
    }
}
