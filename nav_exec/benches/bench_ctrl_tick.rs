//! Benchmark for the waypoint control cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nav_lib::goal_tracker::GoalSnapshot;
use nav_lib::waypoint_ctrl::{InputData, Params, WaypointCtrl};
use nav_if::msg::NavMode;
use util::module::State;

fn bench_ctrl_tick(c: &mut Criterion) {
    let mut ctrl = WaypointCtrl::with_params(Params::default());

    let input = InputData {
        mode: NavMode::Running,
        new_goal: false,
        goal: GoalSnapshot {
            goal_set: true,
            distance_m: 5.0,
            pitch_err_rad: 0.1,
            yaw_err_rad: 0.3
        }
    };

    c.bench_function("waypoint_ctrl proc", |b| {
        b.iter(|| ctrl.proc(black_box(&input)))
    });
}

criterion_group!(benches, bench_ctrl_tick);
criterion_main!(benches);
