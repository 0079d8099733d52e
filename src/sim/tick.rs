//! Per-frame simulation tick
//!
//! Commands are handled first in every phase. Everything else only runs
//! while Playing, in this order: terrain streaming, player, pickups,
//! enemies, projectiles, despawn, cosmetic markers, then the timers.

use glam::Vec2;

use super::collision::{Aabb, Collider, HitTarget};
use super::enemy::EnemyContext;
use super::player::PLAYER_SIZE;
use super::projectile::{ImpactMarker, ProjectileStep};
use super::session::Session;
use super::state::{Body, DamageOutcome, EntityKind, GameEvent, GamePhase};
use crate::audio::SoundEffect;
use crate::narration::NARRATIVE_QUOTES;

/// Input snapshot for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Forward/back axis in [-1, 1] (W minus S)
    pub move_forward: f32,
    /// Right/left axis in [-1, 1] (D minus A)
    pub move_right: f32,
    /// Run modifier held
    pub run: bool,
    /// Jump pressed this tick (not buffered while airborne)
    pub jump: bool,
    /// Trigger pressed this tick; presses during the cooldown are ignored
    pub fire: bool,
    /// Pointer movement since the last tick
    pub pointer_delta: Vec2,
    /// Host currently has the pointer locked
    pub pointer_locked: bool,
    /// Escape pressed this tick
    pub escape: bool,
    /// Restart pressed this tick
    pub restart: bool,
}

/// Advance the session by one frame of `dt` seconds
pub fn tick(session: &mut Session, input: &TickInput, dt: f32) {
    if !session.running {
        return;
    }

    // Commands
    if input.escape {
        match session.phase {
            GamePhase::Playing => session.pause_game(),
            GamePhase::Paused => session.resume_game(),
            GamePhase::GameOver => session.return_to_menu(),
            GamePhase::Menu => {}
        }
    }
    if input.restart && session.phase == GamePhase::GameOver {
        session.reset_game();
    }

    let dt = if dt.is_finite() {
        dt.clamp(0.0, session.tuning.max_frame_dt) * session.time_scale
    } else {
        0.0
    };

    match session.phase {
        GamePhase::Playing => {}
        GamePhase::GameOver => {
            update_impacts(session, dt);
            return;
        }
        GamePhase::Menu | GamePhase::Paused => return,
    }

    session.survived += dt;

    session.chunks.maintain(
        &session.field,
        session.player.position(),
        session.services.renderer.as_mut(),
    );

    update_player(session, input, dt);
    update_pickups(session, dt);
    if !update_enemies(session, dt) {
        return;
    }
    update_projectiles(session, dt);
    despawn_far_enemies(session);
    update_impacts(session, dt);
    update_timers(session, input, dt);
}

fn update_player(session: &mut Session, input: &TickInput, dt: f32) {
    let tuning = &session.tuning;
    let player = &mut session.player;

    if session.pointer_captured && input.pointer_locked {
        let speed = tuning.player.look_speed * session.settings.look_sensitivity;
        player.look(input.pointer_delta, speed);
    }

    let forward = input.move_forward.clamp(-1.0, 1.0);
    let right = input.move_right.clamp(-1.0, 1.0);
    player.walk(forward, right, input.run, dt, &tuning.player);

    if input.jump && player.jump(tuning.player.jump_impulse) {
        session.services.audio.play(SoundEffect::Jump);
    }

    player.update_physics(dt, tuning.gravity, &session.field);

    if !player.body.is_finite() {
        log::error!("Player state went non-finite, respawning");
        player.body = Body::new(glam::Vec3::from_array(tuning.player.spawn));
    }

    if player.moving {
        session.services.audio.ensure_playing(SoundEffect::Footstep);
    } else {
        session.services.audio.stop(SoundEffect::Footstep);
    }

    session.weapon.update(dt);
    if input.fire && session.weapon.ready() {
        let eye = session.player.eye(tuning.player.eye_height);
        let aim = session.player.aim();
        let shots = session
            .weapon
            .fire(eye, aim, &session.tuning.weapon, &mut session.rng);
        if !shots.is_empty() {
            for shot in shots {
                session.world.spawn(EntityKind::Projectile(shot));
            }
            session.services.audio.play(SoundEffect::Shoot);
            session.events.push(GameEvent::ShotFired);
        }
    }
}

/// Spin pickups and collect the ones the player is touching
fn update_pickups(session: &mut Session, dt: f32) {
    let player_box = session.player.bounds();
    let mut touched = Vec::new();
    for id in session.world.pickup_ids() {
        let Some(entity) = session.world.get_mut(id) else {
            continue;
        };
        if let EntityKind::Pickup(pickup) = &mut entity.kind {
            pickup.update(dt);
            if pickup.touches(&player_box) {
                touched.push((id, pickup.kind, pickup.amount));
            }
        }
    }
    for (id, kind, amount) in touched {
        session.collect_pickup(id, kind, amount);
    }
}

/// Colliders for everything a ray can hit this tick
fn snapshot_colliders(session: &Session) -> Vec<Collider> {
    let mut colliders = vec![Collider {
        target: HitTarget::Player,
        bounds: Aabb::from_center(session.player.position(), PLAYER_SIZE),
    }];
    colliders.extend(session.world.enemies().map(|(id, e)| Collider {
        target: HitTarget::Enemy(id),
        bounds: e.bounds(),
    }));
    colliders.extend(session.world.pickups().map(|(id, p)| Collider {
        target: HitTarget::Pickup(id),
        bounds: p.bounds(),
    }));
    colliders
}

/// Returns false if the player died and the rest of the tick is skipped
fn update_enemies(session: &mut Session, dt: f32) -> bool {
    let colliders = snapshot_colliders(session);
    let player = session.player.position();

    for id in session.world.enemy_ids() {
        let ctx = EnemyContext {
            tuning: &session.tuning.enemy,
            gravity: session.tuning.gravity,
            field: &session.field,
            player,
            colliders: &colliders,
        };
        let Some(entity) = session.world.get_mut(id) else {
            debug_assert!(false, "enemy {:?} vanished mid-tick", id);
            continue;
        };
        let EntityKind::Enemy(enemy) = &mut entity.kind else {
            continue;
        };

        let attack = enemy.update(id, dt, &ctx);
        if !enemy.body.is_finite() {
            log::error!("Enemy {:?} went non-finite, despawning", id);
            session.world.remove(id);
            continue;
        }

        if let Some(damage) = attack {
            session.services.audio.play(SoundEffect::Attack);
            session.damage_player(damage);
            if session.phase != GamePhase::Playing {
                return false;
            }
        }
    }
    true
}

fn update_projectiles(session: &mut Session, dt: f32) {
    let mut colliders = snapshot_colliders(session);

    for id in session.world.projectile_ids() {
        let Some(entity) = session.world.get_mut(id) else {
            debug_assert!(false, "projectile {:?} vanished mid-tick", id);
            continue;
        };
        let EntityKind::Projectile(projectile) = &mut entity.kind else {
            continue;
        };

        let damage = projectile.damage;
        let step = projectile.step(dt, &colliders, &session.field);
        let finite = projectile.position.is_finite();

        match step {
            ProjectileStep::Moved if finite => {}
            ProjectileStep::Moved => {
                log::error!("Projectile {:?} went non-finite, despawning", id);
                session.world.remove(id);
            }
            ProjectileStep::Expired => {
                session.world.remove(id);
            }
            ProjectileStep::Hit(hit) => {
                session.world.remove(id);
                session
                    .impacts
                    .push(ImpactMarker::new(hit.point, session.tuning.weapon.impact_lifetime));
                session.events.push(GameEvent::ProjectileImpact { point: hit.point });

                let victim = match hit.target {
                    HitTarget::Enemy(victim) | HitTarget::Pickup(victim) => victim,
                    HitTarget::Terrain | HitTarget::Player => continue,
                };
                let outcome = session
                    .world
                    .get_mut(victim)
                    .and_then(|e| e.damageable())
                    .map(|d| d.take_damage(damage));

                match outcome {
                    Some(DamageOutcome::Died) => {
                        colliders.retain(|c| c.target != hit.target);
                        session.kill_enemy(victim);
                    }
                    Some(DamageOutcome::Collected { kind, amount }) => {
                        colliders.retain(|c| c.target != hit.target);
                        session.collect_pickup(victim, kind, amount);
                    }
                    _ => {}
                }
            }
        }
    }
}

fn despawn_far_enemies(session: &mut Session) {
    let player = session.player.position();
    let limit = session.tuning.enemy.despawn_distance;
    let far: Vec<_> = session
        .world
        .enemies()
        .filter(|(_, e)| e.position().distance(player) > limit)
        .map(|(id, _)| id)
        .collect();
    for id in far {
        session.world.remove(id);
        log::debug!("Despawned enemy {:?}", id);
        session.events.push(GameEvent::EnemyDespawned { id });
    }
}

fn update_impacts(session: &mut Session, dt: f32) {
    session.impacts.retain_mut(|m| m.update(dt));
}

fn update_timers(session: &mut Session, input: &TickInput, dt: f32) {
    let spawn = &session.tuning.spawn;
    let (pickup_every, enemy_every, quote_every) =
        (spawn.pickup_interval, spawn.enemy_interval, spawn.quote_interval);

    session.timers.pickup += dt;
    if session.timers.pickup >= pickup_every {
        session.timers.pickup = 0.0;
        session.spawn_pickup();
    }

    session.timers.quote += dt;
    if session.timers.quote >= quote_every {
        session.timers.quote = 0.0;
        session.quote_index = (session.quote_index + 1) % NARRATIVE_QUOTES.len();
        session.narrate(NARRATIVE_QUOTES[session.quote_index]);
    }

    session.timers.enemy += dt;
    if session.timers.enemy >= enemy_every {
        session.timers.enemy = 0.0;
        session.spawn_enemy_around(input.run);
    }
}
