//! Benchmarks for caption generation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;

use shape_captions::caption::Evaluate;
use shape_captions::captioner::Mode;
use shape_captions::presets;

fn bench_generate_caption(c: &mut Criterion) {
    for name in ["existential", "quantification", "logical"] {
        let (generator, sampler) = presets::load(name).unwrap().build().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let worlds: Vec<_> = (0..32).filter_map(|_| sampler.sample(&mut rng)).collect();

        c.bench_function(&format!("generate_{name}"), |bench| {
            let mut index = 0;
            bench.iter(|| {
                let world = &worlds[index % worlds.len()];
                index += 1;
                black_box(generator.generate_caption(world, index % 2 == 0, Mode::Train, &mut rng))
            })
        });
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let (generator, sampler) = presets::load("quantification").unwrap().build().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    let pairs: Vec<_> = (0..64)
        .filter_map(|_| {
            let world = sampler.sample(&mut rng)?;
            let generated = generator.generate_caption(&world, true, Mode::Train, &mut rng)?;
            Some((world, generated.caption))
        })
        .collect();

    c.bench_function("evaluate_quantification", |bench| {
        bench.iter(|| {
            for (world, caption) in &pairs {
                black_box(caption.evaluate(world));
            }
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let (generator, sampler) = presets::load("existential").unwrap().build().unwrap();
    c.bench_function("batch_existential_64", |bench| {
        bench.iter(|| black_box(generator.generate_batch(&sampler, 64, 3, 0.5, Mode::Train)))
    });
}

criterion_group!(benches, bench_generate_caption, bench_evaluate, bench_batch);
criterion_main!(benches);
