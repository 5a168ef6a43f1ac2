//! First-person movement over the terrain: walking with toroidal wraparound,
//! mouse look, and a closed-form jump arc.

use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use bevy::prelude::*;
use serde::Deserialize;

use crate::elevation::{Elevation, ElevationSource};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionSettings {
    /// Walking speed per held key, in world units per second
    pub move_rate: f32,
    /// Initial upward speed of a jump
    pub jump_speed: f32,
    pub gravity: f32,
    /// Largest pitch of the view, up or down, in radians
    pub pitch_limit: f32,
    /// Height of the eye above the ground
    pub eye_height: f32,
    pub start_orientation: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            move_rate: 100.,
            jump_speed: 75.,
            gravity: 125.,
            pitch_limit: 0.45 * PI,
            eye_height: 5.,
            start_orientation: FRAC_PI_2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionState {
    Grounded,
    Jumping {
        started_at: f64,
        /// Ground height at take-off, captured on the first update of the jump
        initial_elevation: Option<f32>,
    },
}

/// Where the viewpoint is and how it looks at the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPose {
    /// Yaw, pitch and eye height
    pub view_sph: Vec3,
    pub position: Vec3,
    /// Surface alignment angles about y and x
    pub alignment: Vec2,
    /// Heading of forward movement in the xy plane
    pub orientation: f32,
}

impl ViewPose {
    pub fn new(settings: &MotionSettings) -> Self {
        Self {
            view_sph: Vec3::new(0., 0., settings.eye_height),
            position: Vec3::ZERO,
            alignment: Vec2::ZERO,
            orientation: settings.start_orientation,
        }
    }

    /// World to eye transform. The eye looks down -z with y up, so the z-up
    /// terrain is first rolled onto its back.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(-FRAC_PI_2)
            * Mat4::from_rotation_x(self.view_sph.y)
            * Mat4::from_rotation_z(self.view_sph.x)
            * Mat4::from_rotation_y(self.alignment.x)
            * Mat4::from_rotation_x(self.alignment.y)
            * Mat4::from_translation(Vec3::new(0., 0., -self.view_sph.z))
            * Mat4::from_translation(-self.position)
    }

    /// Camera placement in terrain space.
    pub fn camera_transform(&self) -> Transform {
        Transform::from_matrix(self.view_matrix().inverse())
    }
}

#[derive(Clone, Debug)]
pub struct ViewportMotion {
    settings: MotionSettings,
    walkable_size: Vec2,
    pub pose: ViewPose,
    pub state: MotionState,

    side_rate: f32,
    forward_rate: f32,
    // Input collected mid-air, applied on landing
    queued_side_rate: f32,
    queued_forward_rate: f32,
    queued_orientation: f32,

    last_update: f64,
    redraw: bool,
}

impl ViewportMotion {
    pub fn new(settings: MotionSettings, walkable_size: Vec2) -> Self {
        Self {
            pose: ViewPose::new(&settings),
            settings,
            walkable_size,
            state: MotionState::Grounded,
            side_rate: 0.,
            forward_rate: 0.,
            queued_side_rate: 0.,
            queued_forward_rate: 0.,
            queued_orientation: 0.,
            last_update: 0.,
            redraw: true,
        }
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    pub fn is_jumping(&self) -> bool {
        matches!(self.state, MotionState::Jumping { .. })
    }

    /// Current (side, forward) walking rates, not counting queued input.
    pub fn rates(&self) -> (f32, f32) {
        (self.side_rate, self.forward_rate)
    }

    fn adjust_rate(&mut self, key: MoveKey, sign: f32) {
        let rate = self.settings.move_rate * sign;
        let jumping = self.is_jumping();
        let (side, forward) = if jumping {
            (&mut self.queued_side_rate, &mut self.queued_forward_rate)
        } else {
            (&mut self.side_rate, &mut self.forward_rate)
        };

        match key {
            MoveKey::Forward => *forward += rate,
            MoveKey::Back => *forward -= rate,
            MoveKey::Left => *side -= rate,
            MoveKey::Right => *side += rate,
        }
    }

    pub fn press(&mut self, key: MoveKey, now: f64) {
        self.adjust_rate(key, 1.);
        self.last_update = now;
        self.redraw = true;
    }

    pub fn release(&mut self, key: MoveKey) {
        self.adjust_rate(key, -1.);
    }

    /// Mouse motion in pixels; one window width turns half a revolution.
    pub fn look(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        let yaw = PI * dx / width;

        if self.is_jumping() {
            self.queued_orientation -= yaw;
        } else {
            self.pose.orientation -= yaw;
        }

        let limit = self.settings.pitch_limit;
        self.pose.view_sph.x += yaw;
        self.pose.view_sph.y =
            (self.pose.view_sph.y + 0.5 * PI * dy / height).clamp(-limit, limit);

        self.redraw = true;
    }

    /// Starts a jump unless one is already under way.
    pub fn jump(&mut self, now: f64) {
        if self.state == MotionState::Grounded {
            self.state = MotionState::Jumping {
                started_at: now,
                initial_elevation: None,
            };
            self.redraw = true;
        }
    }

    /// Puts the viewpoint on the ground at its current position.
    pub fn settle(&mut self, ground: &impl ElevationSource) {
        let elevation = ground.elevation(self.pose.position.x, self.pose.position.y);
        self.apply(elevation);
    }

    fn apply(&mut self, elevation: Elevation) {
        self.pose.position.z = elevation.height;
        self.pose.alignment = Vec2::new(elevation.tilt_xz, elevation.tilt_yz);
    }

    /// Wrap a coordinate into `-size / 2..size / 2`, however far outside it is.
    fn wrap(value: f32, size: f32) -> f32 {
        let half = size / 2.;
        (value + half).rem_euclid(size) - half
    }

    /// Advances movement and the jump arc to time `now`. Returns whether the
    /// view changed since the last update.
    pub fn update(&mut self, now: f64, ground: &impl ElevationSource) -> bool {
        let position = self.pose.position;
        let mut elevation = ground.elevation(position.x, position.y);

        if self.side_rate != 0. || self.forward_rate != 0. {
            let (mut side, mut forward) = (self.side_rate, self.forward_rate);
            if side != 0. && forward != 0. {
                side *= FRAC_1_SQRT_2;
                forward *= FRAC_1_SQRT_2;
            }

            let dt = (now - self.last_update) as f32;
            let (sin, cos) = self.pose.orientation.sin_cos();
            let heading = Vec2::new(cos, sin);
            let strafe = Vec2::new(heading.y, -heading.x);
            let step = (heading * forward + strafe * side) * dt;

            let pose = &mut self.pose;
            pose.position.x = Self::wrap(pose.position.x + step.x, self.walkable_size.x);
            pose.position.y = Self::wrap(pose.position.y + step.y, self.walkable_size.y);

            elevation = ground.elevation(pose.position.x, pose.position.y);
            self.redraw = true;
        }

        if let MotionState::Jumping {
            started_at,
            initial_elevation,
        } = self.state
        {
            let initial = initial_elevation.unwrap_or(elevation.height);
            let t = (now - started_at) as f32;
            let arc = initial + self.settings.jump_speed * t - 0.5 * self.settings.gravity * t * t;

            // Still rising from the take-off point on the frame of the jump
            if t <= 0. || arc > elevation.height {
                let clearance = arc - elevation.height;
                let blend = if clearance < 1. { 1. - clearance } else { 0. };
                elevation = Elevation {
                    height: arc,
                    tilt_xz: elevation.tilt_xz * blend,
                    tilt_yz: elevation.tilt_yz * blend,
                };
                self.state = MotionState::Jumping {
                    started_at,
                    initial_elevation: Some(initial),
                };
            } else {
                self.land();
            }

            self.redraw = true;
        }

        let redraw = std::mem::take(&mut self.redraw);
        if redraw {
            self.apply(elevation);
        }

        self.last_update = now;
        redraw
    }

    fn land(&mut self) {
        self.state = MotionState::Grounded;
        self.pose.orientation += std::mem::take(&mut self.queued_orientation);
        self.forward_rate += std::mem::take(&mut self.queued_forward_rate);
        self.side_rate += std::mem::take(&mut self.queued_side_rate);
    }
}
