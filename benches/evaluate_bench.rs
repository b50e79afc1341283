use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat4, Quat, Vec3};
use skeletal_pose::{
    AnimationClip, BoneDesc, BoneTrackDesc, Keyframe, PlaybackState, PoseEvaluator, PostState,
    Skeleton,
};
use std::hint::black_box;

const BONE_COUNT: u32 = 64;
const KEYS_PER_CHANNEL: usize = 32;

/// A binary-tree hierarchy of deforming bones with a tail of dummies,
/// roughly the shape of a humanoid rig with attachment helpers.
fn build_skeleton() -> Skeleton {
    let mut builder = Skeleton::builder();
    for i in 0..BONE_COUNT {
        let parent = if i == 0 { None } else { Some((i - 1) / 2) };
        let desc = BoneDesc {
            rest_transform: Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
            ..BoneDesc::default()
        };
        builder.bone(&format!("bone_{i}"), parent, desc).unwrap();
    }
    for i in 0..8u32 {
        let desc = BoneDesc {
            is_dummy: true,
            ..BoneDesc::default()
        };
        builder
            .bone(&format!("helper_{i}"), Some(i % BONE_COUNT), desc)
            .unwrap();
    }
    builder.finish().unwrap()
}

fn build_clip(skeleton: &Skeleton) -> AnimationClip {
    let duration = 100.0;
    let mut builder = AnimationClip::builder("run", duration, 30.0);
    for i in 0..BONE_COUNT {
        let mut translation = Vec::with_capacity(KEYS_PER_CHANNEL);
        let mut rotation = Vec::with_capacity(KEYS_PER_CHANNEL);
        for k in 0..KEYS_PER_CHANNEL {
            let t = k as f32 * duration / KEYS_PER_CHANNEL as f32;
            let phase = t * 0.1 + i as f32;
            translation.push(Keyframe::new(t, Vec3::new(phase.sin(), 0.5, 0.0)));
            rotation.push(Keyframe::new(t, Quat::from_rotation_z(phase.sin() * 0.4)));
        }
        builder
            .track(
                i,
                BoneTrackDesc {
                    translation: Some(translation),
                    rotation: Some(rotation),
                    post_state: PostState::Repeat,
                    ..BoneTrackDesc::default()
                },
            )
            .unwrap();
    }
    builder.finish(skeleton).unwrap()
}

fn evaluate_benchmark(c: &mut Criterion) {
    let skeleton = build_skeleton();
    let clip = build_clip(&skeleton);
    let mut state = PlaybackState::new();
    let mut evaluator = PoseEvaluator::new();

    c.bench_function("evaluate_64_bones", |b| {
        let mut time = 0.0f32;
        b.iter(|| {
            time += 0.016;
            black_box(evaluator.evaluate(&skeleton, &clip, black_box(time), 0.0, &mut state));
        })
    });

    c.bench_function("evaluate_with_blend", |b| {
        let mut time = 0.0f32;
        b.iter(|| {
            time += 0.016;
            black_box(evaluator.evaluate(&skeleton, &clip, black_box(time), 0.2, &mut state));
        })
    });

    c.bench_function("evaluate_bind_pose", |b| {
        b.iter(|| {
            black_box(evaluator.evaluate_bind_pose(&skeleton, &mut state));
        })
    });
}

criterion_group!(benches, evaluate_benchmark);
criterion_main!(benches);
