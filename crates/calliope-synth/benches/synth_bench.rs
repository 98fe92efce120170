//! Benchmarks for the voice render hot path.

use criterion::{criterion_group, criterion_main, Criterion};

use calliope_core::{AudioBuffer, Processor};
use calliope_synth::{Voice, VoiceManager, MAX_VOICES};

fn bench_single_voice(c: &mut Criterion) {
    let mut voice = Voice::new(48_000.0);
    voice.note_on(440.0, 1.0);
    let mut block = [0.0f32; 512];

    c.bench_function("voice_pull_512", |b| {
        b.iter(|| {
            voice.pull(&mut block);
            std::hint::black_box(block[0]);
        })
    });
}

fn bench_full_polyphony(c: &mut Criterion) {
    let mut vm: VoiceManager<MAX_VOICES> = VoiceManager::new(48_000.0, 512);
    for pitch in 48..48 + MAX_VOICES as u8 {
        vm.note_on(pitch, 1.0, None);
    }
    let mut left = [0.0f32; 512];
    let mut right = [0.0f32; 512];

    c.bench_function("voice_manager_16_stereo_512", |b| {
        b.iter(|| {
            let mut buf = AudioBuffer::new(&mut left, &mut right);
            vm.pull_stereo(&mut buf);
            std::hint::black_box(left[0]);
        })
    });
}

criterion_group!(benches, bench_single_voice, bench_full_polyphony);
criterion_main!(benches);
