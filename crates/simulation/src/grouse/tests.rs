#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    use crate::config::{GROUSE_MAX_HEALTH, GROUSE_SURPRISE_SECS, TILE_SIZE};
    use crate::grouse::{
        deterministic_id, launch_grouse, select_new_tree, step_grouse, Grouse, GrouseAnim,
        GrouseCtx, GrouseState,
    };
    use crate::trees::PerchTree;

    fn perched_at(tree: &PerchTree) -> (Grouse, GrouseAnim) {
        (
            Grouse {
                id: 1,
                location: "Forest".to_string(),
                tree_tile: tree.tile,
                state: GrouseState::Perched,
                position: tree.canopy,
                velocity: Vec2::ZERO,
                hiding: false,
                target_tree: None,
                health: GROUSE_MAX_HEALTH,
            },
            GrouseAnim::default(),
        )
    }

    fn big_bounds() -> Rect {
        Rect::new(0.0, 0.0, 100.0 * TILE_SIZE, 100.0 * TILE_SIZE)
    }

    #[test]
    fn test_selection_prefers_distant_trees() {
        let near = PerchTree::at_tile(IVec2::new(51, 50));
        let mid = PerchTree::at_tile(IVec2::new(56, 50));
        let far = PerchTree::at_tile(IVec2::new(90, 50));
        let current = IVec2::new(50, 50);
        let position = PerchTree::at_tile(current).canopy;
        let trees = vec![PerchTree::at_tile(current), near, mid, far];
        let claimed = HashSet::from([current]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (mut near_picks, mut mid_picks, mut far_picks) = (0, 0, 0);
        for _ in 0..10_000 {
            let pick = select_new_tree(position, current, &claimed, &trees, &mut rng)
                .expect("candidates exist");
            assert_ne!(pick.tile, current);
            match pick.tile {
                t if t == near.tile => near_picks += 1,
                t if t == mid.tile => mid_picks += 1,
                _ => far_picks += 1,
            }
        }
        // Squared-distance weighting: the far tree dominates, and the draw
        // frequencies follow the distance ordering.
        assert!(
            far_picks > 9_000,
            "distant tree picked only {} of 10000 draws",
            far_picks
        );
        assert!(mid_picks > near_picks);
    }

    #[test]
    fn test_selection_skips_claimed_trees() {
        let a = PerchTree::at_tile(IVec2::new(10, 10));
        let b = PerchTree::at_tile(IVec2::new(20, 10));
        let trees = vec![a, b];
        let claimed = HashSet::from([a.tile, b.tile]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(
            select_new_tree(Vec2::ZERO, IVec2::new(5, 5), &claimed, &trees, &mut rng).is_none()
        );
    }

    #[test]
    fn test_selection_single_candidate() {
        let only = PerchTree::at_tile(IVec2::new(10, 10));
        let trees = vec![only];
        let claimed = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pick = select_new_tree(only.canopy, IVec2::new(5, 5), &claimed, &trees, &mut rng)
            .expect("one candidate");
        assert_eq!(pick.tile, only.tile);
    }

    #[test]
    fn test_selection_zero_total_weight_takes_first() {
        // Both candidates sit exactly on the bird, so the weights are zero.
        let a = PerchTree {
            tile: IVec2::new(1, 1),
            canopy: Vec2::new(64.0, 64.0),
        };
        let b = PerchTree {
            tile: IVec2::new(2, 2),
            canopy: Vec2::new(64.0, 64.0),
        };
        let trees = vec![a, b];
        let claimed = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pick = select_new_tree(
            Vec2::new(64.0, 64.0),
            IVec2::new(9, 9),
            &claimed,
            &trees,
            &mut rng,
        )
        .expect("candidates exist");
        assert_eq!(pick.tile, a.tile);
    }

    #[test]
    fn test_deterministic_ids() {
        let a = deterministic_id("Forest", 12, IVec2::new(4, 9), None);
        let b = deterministic_id("Forest", 12, IVec2::new(4, 9), None);
        assert_eq!(a, b);
        assert_ne!(a, deterministic_id("Forest", 13, IVec2::new(4, 9), None));
        assert_ne!(a, deterministic_id("Town", 12, IVec2::new(4, 9), None));
        assert_ne!(a, deterministic_id("Forest", 12, IVec2::new(4, 9), Some(1)));
    }

    #[test]
    fn test_launched_grouse_gets_salted_id() {
        let tree = PerchTree::at_tile(IVec2::new(4, 9));
        let mut world = World::new();
        let id = {
            let mut commands = world.commands();
            launch_grouse(&mut commands, "Forest", 12, &tree, 77)
        };
        world.flush();
        assert_eq!(id, deterministic_id("Forest", 12, tree.tile, Some(77)));
        assert_ne!(
            id,
            deterministic_id("Forest", 12, tree.tile, None),
            "a launched bird must not collide with the tree's daily spawn"
        );
        let mut query = world.query::<&Grouse>();
        let bird = query.single(&world);
        assert_eq!(bird.id, id);
        assert_eq!(bird.state, GrouseState::Perched);
        assert_eq!(bird.position, tree.canopy);
    }

    #[test]
    fn test_double_flush_is_idempotent() {
        let tree = PerchTree::at_tile(IVec2::new(50, 50));
        let (mut bird, mut anim) = perched_at(&tree);
        assert!(bird.try_flush(&mut anim));
        assert_eq!(bird.state, GrouseState::Surprised);
        // Advance partway into the startle, then deliver a duplicate flush.
        anim.state_timer = GROUSE_SURPRISE_SECS * 0.5;
        assert!(!bird.try_flush(&mut anim));
        assert_eq!(bird.state, GrouseState::Surprised);
        assert!(
            anim.state_timer > 0.0,
            "duplicate flush must not reset the startle timer"
        );
    }

    #[test]
    fn test_flush_cycle_relocates_to_other_tree() {
        let home = PerchTree::at_tile(IVec2::new(50, 50));
        let other = PerchTree::at_tile(IVec2::new(70, 50));
        let trees = vec![home, other];
        let claimed = HashSet::from([home.tile]);
        let (mut bird, mut anim) = perched_at(&home);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(bird.try_flush(&mut anim));

        let ctx = GrouseCtx {
            dt: 0.05,
            trees: &trees,
            claimed: &claimed,
            bounds: big_bounds(),
        };
        let mut seen_flying = false;
        for _ in 0..2_000 {
            let outcome = step_grouse(&mut bird, &mut anim, &ctx, &mut rng);
            assert!(!outcome.remove, "bird left the map mid-cycle");
            if bird.state == GrouseState::Flying {
                seen_flying = true;
            }
            if seen_flying && bird.state == GrouseState::Perched {
                break;
            }
        }
        assert_eq!(bird.state, GrouseState::Perched);
        assert_eq!(bird.tree_tile, other.tile, "must re-perch on the other tree");
        assert_eq!(bird.position, other.canopy);
        assert!(bird.target_tree.is_none());
    }

    #[test]
    fn test_flier_with_no_trees_leaves_map() {
        let home = PerchTree::at_tile(IVec2::new(50, 50));
        let trees = vec![home];
        let claimed = HashSet::from([home.tile]);
        let (mut bird, mut anim) = perched_at(&home);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        bird.try_flush(&mut anim);

        let ctx = GrouseCtx {
            dt: 0.05,
            trees: &trees,
            claimed: &claimed,
            bounds: big_bounds(),
        };
        let mut removed = false;
        for _ in 0..2_000 {
            if step_grouse(&mut bird, &mut anim, &ctx, &mut rng).remove {
                removed = true;
                break;
            }
            assert_ne!(
                bird.state,
                GrouseState::Landing,
                "nothing to land on without a free tree"
            );
        }
        assert!(removed, "bird should exit the map and be removed");
    }

    #[test]
    fn test_knockdown_flashes_fades_then_removes() {
        let tree = PerchTree::at_tile(IVec2::new(50, 50));
        let trees = vec![tree];
        let claimed = HashSet::new();
        let (mut bird, mut anim) = perched_at(&tree);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(bird.knock_down(&mut anim));
        assert!(!bird.knock_down(&mut anim), "knockdown must not re-enter");
        assert_eq!(bird.health, 0);
        assert!(bird.velocity.y > 0.0, "tumbles downward");

        let ctx = GrouseCtx {
            dt: 0.1,
            trees: &trees,
            claimed: &claimed,
            bounds: big_bounds(),
        };
        let mut steps = 0;
        loop {
            let outcome = step_grouse(&mut bird, &mut anim, &ctx, &mut rng);
            steps += 1;
            if outcome.remove {
                break;
            }
            assert!(steps < 100, "knockdown never completed");
        }
        // 0.8s flash + 1.2s fade at 0.1s per step.
        assert!(steps >= 19, "removed after only {} steps", steps);
        assert!(anim.fade <= 0.0);
    }

    #[test]
    fn test_surprise_hold_then_shake_on_flush() {
        let tree = PerchTree::at_tile(IVec2::new(50, 50));
        let trees = vec![tree];
        let claimed = HashSet::new();
        let (mut bird, mut anim) = perched_at(&tree);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        bird.try_flush(&mut anim);

        let ctx = GrouseCtx {
            dt: 0.1,
            trees: &trees,
            claimed: &claimed,
            bounds: big_bounds(),
        };
        let mut shook = None;
        for _ in 0..10 {
            let outcome = step_grouse(&mut bird, &mut anim, &ctx, &mut rng);
            if let Some(tile) = outcome.shake {
                shook = Some(tile);
                break;
            }
            assert_eq!(
                bird.state,
                GrouseState::Surprised,
                "no movement before the startle ends"
            );
            assert_eq!(bird.position, tree.canopy);
        }
        assert_eq!(shook, Some(tree.tile), "flush shakes the home tree");
        assert_eq!(bird.state, GrouseState::Flushing);
    }

    #[test]
    fn test_perched_hide_cycle_toggles() {
        let tree = PerchTree::at_tile(IVec2::new(50, 50));
        let trees = vec![tree];
        let claimed = HashSet::new();
        let (mut bird, mut anim) = perched_at(&tree);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ctx = GrouseCtx {
            dt: 0.1,
            trees: &trees,
            claimed: &claimed,
            bounds: big_bounds(),
        };
        assert!(!bird.hiding);
        // Perch animates at 2 fps and the flag toggles every 7 frames.
        for _ in 0..40 {
            step_grouse(&mut bird, &mut anim, &ctx, &mut rng);
        }
        assert!(bird.hiding, "hide flag should have toggled by now");
        assert!(anim.hide_progress > 0.0);
        for _ in 0..40 {
            step_grouse(&mut bird, &mut anim, &ctx, &mut rng);
        }
        assert!(!bird.hiding, "hide flag should toggle back");
    }

    #[test]
    fn test_state_change_resets_animation_counters() {
        let tree = PerchTree::at_tile(IVec2::new(50, 50));
        let (mut bird, mut anim) = perched_at(&tree);
        anim.frame = 9;
        anim.frame_timer = 0.3;
        anim.state_timer = 5.0;
        bird.try_flush(&mut anim);
        assert_eq!(anim.frame, 0);
        assert_eq!(anim.frame_timer, 0.0);
        assert_eq!(anim.state_timer, 0.0);
    }
}
