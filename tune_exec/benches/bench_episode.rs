//! # Episode and Training Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector2;
use std::sync::Arc;

use tune_lib::{
    eval::{EpisodeEvaluator, EvalParams},
    pso::{new_rng, ParticleSwarmOptimizer, PsoParams},
    traj::Trajectory,
    traj_ctrl::ControlGains,
};

fn episode_benchmark(c: &mut Criterion) {
    // ---- Build the straight line scenario ----

    let traj = Trajectory::direct(Vector2::zeros(), Vector2::new(1000.0, 0.0), 20).unwrap();

    let evaluator = EpisodeEvaluator::new(EvalParams::default()).unwrap();

    let gains = ControlGains::from_vars(&PsoParams::default().init_guess_vars());

    c.bench_function("episode_straight_line", |b| {
        b.iter(|| evaluator.run(&traj, &gains))
    });
}

fn training_benchmark(c: &mut Criterion) {
    let traj = Arc::new(
        Trajectory::direct(Vector2::zeros(), Vector2::new(1000.0, 0.0), 20).unwrap(),
    );

    let params = PsoParams {
        num_bots: 20,
        ..Default::default()
    };

    c.bench_function("train_one_iteration_20_bots", |b| {
        b.iter(|| {
            let mut pso = ParticleSwarmOptimizer::new(
                params.clone(),
                EvalParams::default(),
                traj.clone(),
                new_rng(Some(0)),
            )
            .unwrap();

            pso.train(1, params.learning_rates)
        })
    });
}

criterion_group!(benches, episode_benchmark, training_benchmark);
criterion_main!(benches);
