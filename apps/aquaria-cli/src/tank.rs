//! Demo tank: a handful of entity kinds wired into the registry through a
//! declarative catalog and a shared context.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use aquaria_registry::{
    Catalog, CategoryDescriptor, Collection, Context, Entity, Registry, UpdateArgs, collection,
    entity_ref, with_entity, with_entity_mut,
};
use aquaria_render::{Surface, Viewport};
use glam::Vec2;

/// The surface every tank entity draws on.
pub type Canvas = dyn Surface;
pub type Shared = Collection<Canvas>;
/// Running coin total, shared through the context.
pub type Bank = Rc<Cell<u64>>;

const FLOOR_MARGIN: f32 = 20.0;
const COIN_FALL_SPEED: f32 = 60.0;
const COIN_VALUE: u64 = 15;
const ALIEN_HP: i32 = 100;
const ALIEN_INTERVAL: f64 = 6.0;
const FIRE_INTERVAL: f64 = 0.4;
const MISSILE_SPEED: f32 = 300.0;
const MISSILE_DAMAGE: i32 = 25;
const HIT_RADIUS: f32 = 48.0;
const SPARK_TTL: f32 = 0.6;

/// Deterministic splitmix64 stream for reproducible runs.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        lo + unit * (hi - lo)
    }
}

pub struct Fish {
    pub position: Vec2,
    velocity: Vec2,
    /// Seconds until starvation.
    pub hunger: f32,
    drop_timer: f32,
    drop_interval: f32,
    bounds: Viewport,
    pub dead: bool,
}

impl Entity<Canvas> for Fish {
    fn update(&mut self, dt: f64, args: &UpdateArgs) {
        let dt = dt as f32;
        self.position += self.velocity * dt;
        let swim_floor = self.bounds.height - FLOOR_MARGIN * 3.0;
        if self.position.x < 0.0 || self.position.x > self.bounds.width {
            self.velocity.x = -self.velocity.x;
            self.position.x = self.position.x.clamp(0.0, self.bounds.width);
        }
        if self.position.y < 0.0 || self.position.y > swim_floor {
            self.velocity.y = -self.velocity.y;
            self.position.y = self.position.y.clamp(0.0, swim_floor);
        }

        self.hunger -= dt;
        if self.hunger <= 0.0 {
            self.dead = true;
            return;
        }

        self.drop_timer -= dt;
        if self.drop_timer <= 0.0 {
            self.drop_timer += self.drop_interval;
            if let Some(coins) = args.get::<Shared>(0) {
                coins.borrow_mut().push(entity_ref(Coin {
                    position: self.position,
                    value: COIN_VALUE,
                    floor: self.bounds.height - FLOOR_MARGIN,
                    collected: false,
                }));
            }
        }
    }

    fn draw(&self, surface: &mut Canvas) {
        let sprite = if self.hunger < 5.0 { "guppy_hungry" } else { "guppy" };
        surface.sprite(sprite, self.position);
    }
}

pub struct Coin {
    pub position: Vec2,
    pub value: u64,
    floor: f32,
    pub collected: bool,
}

impl Entity<Canvas> for Coin {
    fn update(&mut self, dt: f64, args: &UpdateArgs) {
        self.position.y += COIN_FALL_SPEED * dt as f32;
        if self.position.y >= self.floor {
            self.position.y = self.floor;
            if let Some(bank) = args.get::<Bank>(0) {
                bank.set(bank.get() + self.value);
            }
            self.collected = true;
        }
    }

    fn draw(&self, surface: &mut Canvas) {
        surface.sprite("coin", self.position);
    }
}

/// Bottom-dwelling pet. Never leaves the tank.
pub struct Snail {
    pub position: Vec2,
    speed: f32,
    bounds: Viewport,
}

impl Entity<Canvas> for Snail {
    fn update(&mut self, dt: f64, _args: &UpdateArgs) {
        self.position.x += self.speed * dt as f32;
        if self.position.x < 0.0 || self.position.x > self.bounds.width {
            self.speed = -self.speed;
            self.position.x = self.position.x.clamp(0.0, self.bounds.width);
        }
    }

    fn draw(&self, surface: &mut Canvas) {
        surface.sprite("snail", self.position);
    }
}

/// Collaborators an alien needs: missiles to be hit by, and somewhere to
/// put its death sparks.
pub struct AlienArgs {
    pub missiles: Option<Shared>,
    pub particles: Option<Shared>,
}

pub struct Alien {
    pub position: Vec2,
    velocity: Vec2,
    pub hp: i32,
    bounds: Viewport,
    pub dead: bool,
}

impl Entity<Canvas> for Alien {
    fn update(&mut self, dt: f64, args: &UpdateArgs) {
        self.position += self.velocity * dt as f32;
        if self.position.x < 0.0 || self.position.x > self.bounds.width {
            self.velocity.x = -self.velocity.x;
            self.position.x = self.position.x.clamp(0.0, self.bounds.width);
        }

        let Some(args) = args.get::<AlienArgs>(0) else {
            return;
        };
        if let Some(missiles) = &args.missiles {
            for missile in missiles.borrow().iter() {
                with_entity_mut(missile, |m: &mut Missile| {
                    if !m.spent && m.position.distance(self.position) < HIT_RADIUS {
                        m.spent = true;
                        self.hp -= m.damage;
                    }
                });
            }
        }

        if self.hp <= 0 && !self.dead {
            self.dead = true;
            if let Some(particles) = &args.particles {
                let mut particles = particles.borrow_mut();
                for i in 0..8 {
                    let angle = i as f32 * std::f32::consts::FRAC_PI_4;
                    particles.push(entity_ref(Spark {
                        position: self.position,
                        velocity: Vec2::from_angle(angle) * 80.0,
                        ttl: SPARK_TTL,
                    }));
                }
            }
        }
    }

    fn draw(&self, surface: &mut Canvas) {
        surface.sprite("alien", self.position);
        surface.label(&format!("hp {}", self.hp), self.position - Vec2::new(0.0, 30.0));
    }
}

pub struct Missile {
    pub position: Vec2,
    velocity: Vec2,
    pub damage: i32,
    bounds: Viewport,
    pub spent: bool,
}

impl Entity<Canvas> for Missile {
    fn update(&mut self, dt: f64, _args: &UpdateArgs) {
        self.position += self.velocity * dt as f32;
        if !self.bounds.contains(self.position) {
            self.spent = true;
        }
    }

    fn draw(&self, surface: &mut Canvas) {
        surface.sprite("missile", self.position);
    }
}

pub struct Spark {
    pub position: Vec2,
    velocity: Vec2,
    pub ttl: f32,
}

impl Entity<Canvas> for Spark {
    fn update(&mut self, dt: f64, _args: &UpdateArgs) {
        let dt = dt as f32;
        self.position += self.velocity * dt;
        self.ttl -= dt;
    }

    fn draw(&self, surface: &mut Canvas) {
        surface.sprite("spark", self.position);
    }
}

/// Category catalog for the tank. Background to foreground:
/// pet 1, fish 2, coin 3, alien 4, missile 5, particle 6.
pub fn standard_catalog() -> Catalog {
    Catalog::new()
        .with("pet", CategoryDescriptor::new(1))
        .with(
            "fish",
            CategoryDescriptor::new(2)
                .remove_when(|f: &Fish| f.dead)
                .with_extra_args(|_: &Fish, ctx| UpdateArgs::new().with_shared(ctx.shared("coins"))),
        )
        .with(
            "coin",
            CategoryDescriptor::new(3)
                .remove_when(|c: &Coin| c.collected)
                .with_extra_args(|_: &Coin, ctx| UpdateArgs::new().with_shared(ctx.shared("bank"))),
        )
        .with(
            "alien",
            CategoryDescriptor::new(4)
                .remove_when(|a: &Alien| a.dead)
                .with_extra_args(|_: &Alien, ctx| {
                    UpdateArgs::new().with(AlienArgs {
                        missiles: ctx.get::<Shared>("missiles").cloned(),
                        particles: ctx.get::<Shared>("particles").cloned(),
                    })
                }),
        )
        .with(
            "missile",
            CategoryDescriptor::new(5).remove_when(|m: &Missile| m.spent),
        )
        .with(
            "particle",
            CategoryDescriptor::new(6).remove_when(|s: &Spark| s.ttl <= 0.0),
        )
}

/// A running tank: registry, collections, spawn timers.
pub struct Tank {
    pub registry: Registry<Canvas>,
    viewport: Viewport,
    rng: Rng,
    bank: Bank,
    aliens: Shared,
    missiles: Shared,
    frame: u64,
    elapsed: f64,
    alien_timer: f64,
    fire_timer: f64,
}

impl Tank {
    pub fn new(seed: u64, fish_count: usize, viewport: Viewport) -> Self {
        let mut rng = Rng::new(seed);
        let floor = viewport.height - FLOOR_MARGIN;

        let fish: Shared = collection((0..fish_count).map(|_| {
            let drop_interval = rng.range(2.0, 5.0);
            entity_ref(Fish {
                position: Vec2::new(
                    rng.range(0.0, viewport.width),
                    rng.range(0.0, viewport.height / 2.0),
                ),
                velocity: Vec2::new(rng.range(-60.0, 60.0), rng.range(-20.0, 20.0)),
                hunger: rng.range(5.0, 40.0),
                drop_timer: drop_interval,
                drop_interval,
                bounds: viewport,
                dead: false,
            })
        }));
        let pets: Shared = collection([entity_ref(Snail {
            position: Vec2::new(viewport.width / 2.0, floor),
            speed: 25.0,
            bounds: viewport,
        })]);
        let coins: Shared = collection([]);
        let aliens: Shared = collection([]);
        let missiles: Shared = collection([]);
        let particles: Shared = collection([]);
        let bank = Bank::default();

        let context = Context::new()
            .with("coins", coins.clone())
            .with("bank", bank.clone())
            .with("missiles", missiles.clone())
            .with("particles", particles.clone());

        let mut registry = Registry::with_context(standard_catalog(), context);
        registry.register("guppies", fish, "fish");
        registry.register("coins", coins, "coin");
        registry.register("snails", pets, "pet");
        registry.register("aliens", aliens.clone(), "alien");
        registry.register("missiles", missiles.clone(), "missile");
        registry.register("sparks", particles, "particle");

        Self {
            registry,
            viewport,
            rng,
            bank,
            aliens,
            missiles,
            frame: 0,
            elapsed: 0.0,
            alien_timer: ALIEN_INTERVAL / 2.0,
            fire_timer: FIRE_INTERVAL,
        }
    }

    /// Advance one frame: spawn waves, fire at aliens, update every entity.
    pub fn step(&mut self, dt: f64) {
        self.elapsed += dt;
        self.alien_timer -= dt;
        if self.alien_timer <= 0.0 && self.aliens.borrow().is_empty() {
            self.spawn_alien();
            self.alien_timer = ALIEN_INTERVAL;
        }

        self.fire_timer -= dt;
        if self.fire_timer <= 0.0 {
            self.fire_timer += FIRE_INTERVAL;
            self.fire();
        }

        self.registry.update_all(dt);
        self.frame += 1;
    }

    /// Draw the current frame onto `surface`.
    pub fn draw(&mut self, surface: &mut Canvas) {
        self.registry.draw_all(surface);
    }

    fn spawn_alien(&mut self) {
        let position = Vec2::new(self.rng.range(0.0, self.viewport.width), 80.0);
        let speed = self.rng.range(-30.0, 30.0);
        tracing::info!(x = position.x, "alien incoming");
        self.aliens.borrow_mut().push(entity_ref(Alien {
            position,
            velocity: Vec2::new(speed, 0.0),
            hp: ALIEN_HP,
            bounds: self.viewport,
            dead: false,
        }));
    }

    fn fire(&mut self) {
        let target = self
            .aliens
            .borrow()
            .first()
            .and_then(|a| with_entity(a, |alien: &Alien| alien.position));
        let Some(target) = target else {
            return;
        };
        let origin = Vec2::new(target.x, self.viewport.height - FLOOR_MARGIN);
        let velocity = (target - origin).normalize_or_zero() * MISSILE_SPEED;
        self.missiles.borrow_mut().push(entity_ref(Missile {
            position: origin,
            velocity,
            damage: MISSILE_DAMAGE,
            bounds: self.viewport,
            spent: false,
        }));
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn bank(&self) -> u64 {
        self.bank.get()
    }

    pub fn summary(&self) -> TankSummary {
        let stats = self.registry.stats();
        TankSummary {
            frame: self.frame,
            elapsed: self.elapsed,
            bank: self.bank.get(),
            collections: self
                .registry
                .registered_names()
                .into_iter()
                .map(|name| {
                    let len = self
                        .registry
                        .get_array(name)
                        .map_or(0, |c| c.borrow().len());
                    (name.to_string(), len)
                })
                .collect(),
            removed_last_frame: stats.entities_removed,
        }
    }
}

/// Snapshot of a tank for logging and CLI output.
#[derive(Debug, Clone)]
pub struct TankSummary {
    pub frame: u64,
    pub elapsed: f64,
    pub bank: u64,
    pub collections: Vec<(String, usize)>,
    pub removed_last_frame: usize,
}

impl TankSummary {
    pub fn count(&self, name: &str) -> Option<usize> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }
}

impl fmt::Display for TankSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tank: frame={} t={:.2}s bank=${} removed={}",
            self.frame, self.elapsed, self.bank, self.removed_last_frame
        )?;
        for (name, len) in &self.collections {
            write!(f, " {name}={len}")?;
        }
        Ok(())
    }
}
