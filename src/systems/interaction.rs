//! Pairwise contact resolution.
//!
//! For every reported contact between two active bubbles the resolver
//! decides between pop, merge and a continuous force:
//!
//! 1. Same variant: pop both when `pop_matching_variants` and the overlap
//!    ratio reaches `min_overlap_to_pop`; otherwise merge when
//!    `merge_matching_variants` and the ratio reaches `min_overlap_to_merge`.
//!    Pop wins when both thresholds are met.
//! 2. Different variants: each side whose rule has `pop_other_variants`
//!    pops the *other* side once the ratio reaches its `min_overlap_to_pop`.
//! 3. Otherwise an equal and opposite force per the first bubble's
//!    [`ForceMode`].
//!
//! Wall contacts push the bubble out along the wall normal.
//!
//! Contacts are canonicalised so the bubble with the lower [`BubbleId`]
//! comes first, de-duplicated and handled in ascending id order. A bubble
//! that already has a pop or merge request queued, from this pass or from an
//! earlier system this tick, is skipped by every later contact. Nothing here changes lifecycle state or the registry; the
//! decisions go out as [`LifecycleRequest`] messages.
use bevy_ecs::prelude::*;
use glam::Vec2;
use rustc_hash::FxHashSet;

use crate::components::boxcollider::{BoxCollider, CirclePenetration, Wall};
use crate::components::bubble::{Bubble, BubbleId};
use crate::components::lifecycle::{Lifecycle, PopCause};
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::events::contact::ContactEvent;
use crate::events::lifecycle::LifecycleRequest;
use crate::resources::variants::{ForceMode, VariantRule, VariantRuleSet};

/// Geometry of two overlapping discs, seen from the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairGeometry {
    /// Unit vector from the other center to this one.
    pub direction: Vec2,
    pub distance: f32,
    pub combined_radii: f32,
    pub overlap: f32,
    /// `overlap / combined_radii`, in `[0, 1]`.
    pub overlap_ratio: f32,
}

impl PairGeometry {
    pub fn new(center: Vec2, radius: f32, other_center: Vec2, other_radius: f32) -> Self {
        let offset = center - other_center;
        let distance = offset.length();
        // Coincident centers still need a push direction.
        let direction = offset.try_normalize().unwrap_or(Vec2::X);
        let combined_radii = radius + other_radius;
        let overlap = (combined_radii - distance).max(0.0);
        let overlap_ratio = if combined_radii > 0.0 {
            overlap / combined_radii
        } else {
            0.0
        };
        Self {
            direction,
            distance,
            combined_radii,
            overlap,
            overlap_ratio,
        }
    }
}

/// One side of a contact as the resolver sees it.
#[derive(Debug, Clone, Copy)]
pub struct ContactSide<'a> {
    pub variant: usize,
    pub rule: &'a VariantRule,
    pub center: Vec2,
    pub radius: f32,
}

/// What a contact resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    /// Pop the flagged sides.
    Pop { a: bool, b: bool },
    Merge,
    /// Force on `a`; `b` receives the opposite.
    Force(Vec2),
    None,
}

/// Decide what happens between `a` and `b`.
pub fn resolve_pair(a: &ContactSide, b: &ContactSide) -> PairOutcome {
    let geometry = PairGeometry::new(a.center, a.radius, b.center, b.radius);
    let ratio = geometry.overlap_ratio;
    let same_variant = a.variant == b.variant;

    if same_variant {
        if a.rule.pop_matching_variants && ratio >= a.rule.min_overlap_to_pop {
            return PairOutcome::Pop { a: true, b: true };
        }
        if a.rule.merge_matching_variants && ratio >= a.rule.min_overlap_to_merge {
            return PairOutcome::Merge;
        }
    } else {
        let pop_b = a.rule.pop_other_variants && ratio >= a.rule.min_overlap_to_pop;
        let pop_a = b.rule.pop_other_variants && ratio >= b.rule.min_overlap_to_pop;
        if pop_a || pop_b {
            return PairOutcome::Pop { a: pop_a, b: pop_b };
        }
    }

    match continuous_force(a.rule, same_variant, &geometry) {
        Some(force) => PairOutcome::Force(force),
        None => PairOutcome::None,
    }
}

/// Force on the first bubble of a pair under `rule`'s interaction mode.
pub fn continuous_force(
    rule: &VariantRule,
    same_variant: bool,
    geometry: &PairGeometry,
) -> Option<Vec2> {
    match rule.interaction(same_variant) {
        ForceMode::None => None,
        ForceMode::Attract => {
            let scale = if geometry.combined_radii > 0.0 {
                (geometry.distance / geometry.combined_radii).clamp(0.0, 1.0)
            } else {
                0.0
            };
            Some(-geometry.direction * rule.attraction_force * scale)
        }
        ForceMode::Repulse => {
            Some(geometry.direction * rule.repulsion_force * geometry.overlap_ratio)
        }
    }
}

/// Push a bubble out of a wall, scaled by penetration over its radius.
pub fn boundary_force(rule: &VariantRule, radius: f32, penetration: CirclePenetration) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let ratio = penetration.depth / radius;
    penetration.normal * rule.repulsion_force * ratio
}

fn canonical(a: (BubbleId, Entity), b: (BubbleId, Entity)) -> (BubbleId, Entity, BubbleId, Entity) {
    if a.0 <= b.0 {
        (a.0, a.1, b.0, b.1)
    } else {
        (b.0, b.1, a.0, a.1)
    }
}

pub fn interaction_system(
    variants: Res<VariantRuleSet>,
    mut contacts: MessageReader<ContactEvent>,
    bubbles: Query<(&BubbleId, &Bubble, &Lifecycle, &MapPosition)>,
    walls: Query<(&MapPosition, &BoxCollider), With<Wall>>,
    mut bodies: Query<&mut RigidBody>,
    mut requests: ParamSet<(MessageReader<LifecycleRequest>, MessageWriter<LifecycleRequest>)>,
) {
    let mut pairs: Vec<(BubbleId, Entity, BubbleId, Entity)> = Vec::new();
    let mut boundaries: Vec<(BubbleId, Entity, Entity)> = Vec::new();
    for contact in contacts.read() {
        match *contact {
            ContactEvent::Pair { a, b } => {
                if a == b {
                    continue;
                }
                let (Ok((id_a, ..)), Ok((id_b, ..))) = (bubbles.get(a), bubbles.get(b)) else {
                    continue;
                };
                pairs.push(canonical((*id_a, a), (*id_b, b)));
            }
            ContactEvent::Boundary { bubble, wall } => {
                if let Ok((id, ..)) = bubbles.get(bubble) {
                    boundaries.push((*id, bubble, wall));
                }
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    boundaries.sort_unstable();
    boundaries.dedup();

    // Requests still waiting to be applied already own their bubbles.
    let mut claimed: FxHashSet<Entity> = FxHashSet::default();
    for request in requests.p0().read() {
        match *request {
            LifecycleRequest::Pop { entity, .. } => {
                claimed.insert(entity);
            }
            LifecycleRequest::Merge { a, b } => {
                claimed.insert(a);
                claimed.insert(b);
            }
        }
    }

    for (_, ea, _, eb) in pairs {
        if claimed.contains(&ea) || claimed.contains(&eb) {
            continue;
        }
        let (Ok((_, bubble_a, lc_a, pos_a)), Ok((_, bubble_b, lc_b, pos_b))) =
            (bubbles.get(ea), bubbles.get(eb))
        else {
            continue;
        };
        if !lc_a.is_active() || !lc_b.is_active() {
            continue;
        }

        let side_a = ContactSide {
            variant: bubble_a.variant,
            rule: variants.rule_for(bubble_a.variant),
            center: pos_a.pos,
            radius: bubble_a.radius(),
        };
        let side_b = ContactSide {
            variant: bubble_b.variant,
            rule: variants.rule_for(bubble_b.variant),
            center: pos_b.pos,
            radius: bubble_b.radius(),
        };

        let force = match resolve_pair(&side_a, &side_b) {
            PairOutcome::Pop { a, b } => {
                let mut requested = false;
                for (flag, entity, bubble) in [(a, ea, bubble_a), (b, eb, bubble_b)] {
                    if flag && !bubble.invulnerable {
                        requests.p1().write(LifecycleRequest::Pop {
                            entity,
                            cause: PopCause::Contact,
                        });
                        claimed.insert(entity);
                        requested = true;
                    }
                }
                if requested {
                    None
                } else {
                    fallback_force(&side_a, &side_b)
                }
            }
            PairOutcome::Merge => {
                if bubble_a.invulnerable || bubble_b.invulnerable {
                    fallback_force(&side_a, &side_b)
                } else {
                    requests.p1().write(LifecycleRequest::Merge { a: ea, b: eb });
                    claimed.insert(ea);
                    claimed.insert(eb);
                    None
                }
            }
            PairOutcome::Force(force) => Some(force),
            PairOutcome::None => None,
        };

        if let Some(force) = force {
            if let Ok(mut body) = bodies.get_mut(ea) {
                body.apply_force(force);
            }
            if let Ok(mut body) = bodies.get_mut(eb) {
                body.apply_force(-force);
            }
        }
    }

    for (_, entity, wall) in boundaries {
        if claimed.contains(&entity) {
            continue;
        }
        let Ok((_, bubble, lifecycle, position)) = bubbles.get(entity) else {
            continue;
        };
        if !lifecycle.is_active() {
            continue;
        }
        let Ok((wall_pos, collider)) = walls.get(wall) else {
            continue;
        };
        let Some(penetration) = collider.circle_penetration(wall_pos.pos, position.pos, bubble.radius())
        else {
            continue;
        };
        let force = boundary_force(variants.rule_for(bubble.variant), bubble.radius(), penetration);
        if let Ok(mut body) = bodies.get_mut(entity) {
            body.apply_force(force);
        }
    }
}

/// Force used when a pop or merge was decided but no side could take it.
fn fallback_force(a: &ContactSide, b: &ContactSide) -> Option<Vec2> {
    let geometry = PairGeometry::new(a.center, a.radius, b.center, b.radius);
    continuous_force(a.rule, a.variant == b.variant, &geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn side(rule: &VariantRule, variant: usize, x: f32) -> ContactSide<'_> {
        ContactSide {
            variant,
            rule,
            center: Vec2::new(x, 0.0),
            radius: 1.0,
        }
    }

    #[test]
    fn test_pair_geometry() {
        let g = PairGeometry::new(Vec2::new(1.5, 0.0), 1.0, Vec2::ZERO, 1.0);
        assert_eq!(g.direction, Vec2::X);
        assert!(approx_eq(g.distance, 1.5));
        assert!(approx_eq(g.overlap, 0.5));
        assert!(approx_eq(g.overlap_ratio, 0.25));
    }

    #[test]
    fn test_pair_geometry_coincident_centers() {
        let g = PairGeometry::new(Vec2::ONE, 1.0, Vec2::ONE, 1.0);
        assert_eq!(g.direction, Vec2::X);
        assert!(approx_eq(g.overlap_ratio, 1.0));
    }

    #[test]
    fn test_below_thresholds_repulses_by_ratio() {
        let rule = VariantRule {
            pop_matching_variants: true,
            min_overlap_to_pop: 0.5,
            min_overlap_to_merge: 0.3,
            repulsion_force: 4.0,
            matching_interaction: ForceMode::Repulse,
            ..VariantRule::default()
        };
        let outcome = resolve_pair(&side(&rule, 0, 0.0), &side(&rule, 0, 1.5));
        match outcome {
            PairOutcome::Force(f) => {
                assert!(approx_eq(f.x, -1.0));
                assert!(approx_eq(f.y, 0.0));
            }
            other => panic!("expected force, got {:?}", other),
        }
    }

    #[test]
    fn test_attract_scales_with_distance() {
        let rule = VariantRule {
            matching_interaction: ForceMode::Attract,
            attraction_force: 2.0,
            merge_matching_variants: false,
            ..VariantRule::default()
        };
        let outcome = resolve_pair(&side(&rule, 0, 0.0), &side(&rule, 0, 1.5));
        // distance / combined = 0.75, pulled toward +x.
        assert_eq!(outcome, PairOutcome::Force(Vec2::new(1.5, 0.0)));
    }

    #[test]
    fn test_none_mode_applies_nothing() {
        let rule = VariantRule {
            matching_interaction: ForceMode::None,
            merge_matching_variants: false,
            ..VariantRule::default()
        };
        assert_eq!(
            resolve_pair(&side(&rule, 0, 0.0), &side(&rule, 0, 1.5)),
            PairOutcome::None
        );
    }

    #[test]
    fn test_pop_beats_merge() {
        let rule = VariantRule {
            pop_matching_variants: true,
            min_overlap_to_pop: 0.3,
            merge_matching_variants: true,
            min_overlap_to_merge: 0.3,
            ..VariantRule::default()
        };
        assert_eq!(
            resolve_pair(&side(&rule, 1, 0.0), &side(&rule, 1, 0.5)),
            PairOutcome::Pop { a: true, b: true }
        );
    }

    #[test]
    fn test_merge_when_pop_disabled() {
        let rule = VariantRule {
            pop_matching_variants: false,
            merge_matching_variants: true,
            min_overlap_to_merge: 0.3,
            ..VariantRule::default()
        };
        assert_eq!(
            resolve_pair(&side(&rule, 1, 0.0), &side(&rule, 1, 1.0)),
            PairOutcome::Merge
        );
    }

    #[test]
    fn test_other_variant_pop_is_asymmetric() {
        let hunter = VariantRule {
            pop_other_variants: true,
            min_overlap_to_pop: 0.2,
            ..VariantRule::default()
        };
        let prey = VariantRule::default();
        assert_eq!(
            resolve_pair(&side(&hunter, 0, 0.0), &side(&prey, 1, 1.0)),
            PairOutcome::Pop { a: false, b: true }
        );
        assert_eq!(
            resolve_pair(&side(&prey, 1, 0.0), &side(&hunter, 0, 1.0)),
            PairOutcome::Pop { a: true, b: false }
        );
    }

    #[test]
    fn test_different_variants_do_not_merge() {
        let rule = VariantRule {
            merge_matching_variants: true,
            min_overlap_to_merge: 0.1,
            other_interaction: ForceMode::None,
            ..VariantRule::default()
        };
        assert_eq!(
            resolve_pair(&side(&rule, 0, 0.0), &side(&rule, 1, 0.5)),
            PairOutcome::None
        );
    }

    #[test]
    fn test_boundary_force() {
        let rule = VariantRule {
            repulsion_force: 10.0,
            ..VariantRule::default()
        };
        let force = boundary_force(
            &rule,
            2.0,
            CirclePenetration {
                normal: Vec2::NEG_Y,
                depth: 0.5,
            },
        );
        assert!(approx_eq(force.y, -2.5));
        assert!(approx_eq(force.x, 0.0));
    }
}
