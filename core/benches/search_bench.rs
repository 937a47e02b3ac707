use criterion::{criterion_group, criterion_main, Criterion};
use pindex_core::tokenizer::parse_words;
use pindex_core::InvertedIndex;

const SYLLABLES: [&str; 8] = ["ka", "ro", "mi", "tel", "sun", "ver", "ox", "la"];

fn synthetic_index(documents: usize, words_per_doc: usize) -> InvertedIndex {
    let mut index = InvertedIndex::new();
    for d in 0..documents {
        let words: Vec<String> = (0..words_per_doc)
            .map(|i| {
                let n = d * 31 + i * 7;
                format!("{}{}{}", SYLLABLES[n % 8], SYLLABLES[(n / 8) % 8], SYLLABLES[(n / 64) % 8])
            })
            .collect();
        index.add_words(&format!("doc{d}.txt"), &words, 1);
    }
    index
}

fn bench_search(c: &mut Criterion) {
    let index = synthetic_index(500, 400);
    let short = parse_words("ka ro");
    let long = parse_words("kamisun telox verla");
    c.bench_function("partial_search_short_prefixes", |b| b.iter(|| index.partial_search(&short)));
    c.bench_function("partial_search_full_words", |b| b.iter(|| index.partial_search(&long)));
}

fn bench_merge(c: &mut Criterion) {
    let parts: Vec<InvertedIndex> = (0..20).map(|_| synthetic_index(10, 400)).collect();
    c.bench_function("merge_twenty_locals", |b| {
        b.iter(|| {
            let mut global = InvertedIndex::new();
            for part in parts.clone() {
                global.merge(part);
            }
            global
        })
    });
}

criterion_group!(benches, bench_search, bench_merge);
criterion_main!(benches);
