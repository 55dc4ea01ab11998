//! Benchmarks for the markup layout engine.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lifeboat_gfx::Surface;
use lifeboat_gfx::text::TextLayout;
use lifeboat_types::color::Palette;
use lifeboat_types::geom::Rect;

/// Generate a menu-like body: headers, bullets, colored status lines.
fn generate_markup(n_lines: usize) -> String {
    let mut out = String::from("<title><b>System update</b>\n");
    for i in 0..n_lines {
        match i % 4 {
            0 => out.push_str(&format!("<bullet>Apply package {i} from external media\n")),
            1 => out.push_str(&format!(
                "<dim>step {i}:<text> verifying payload signature against the stored key\n"
            )),
            2 => out.push_str(&format!(
                "<quote>detail line {i} wraps when the panel is narrow</quote>\n"
            )),
            _ => out.push_str(&format!("<success>package {i} installed<text><br>")),
        }
    }
    out
}

fn bench_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure");
    let palette = Palette::default();

    for n_lines in [10, 100, 400] {
        let markup = generate_markup(n_lines);
        let label = format!("{n_lines}_lines");
        group.bench_with_input(BenchmarkId::new("text_height", &label), &markup, |b, markup| {
            let eng = TextLayout::new(&palette, 1);
            b.iter(|| eng.text_height(markup, 320));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let palette = Palette::default();

    for width in [240u32, 480, 1080] {
        let markup = generate_markup(100);
        let label = format!("{width}px");
        group.bench_with_input(
            BenchmarkId::new("render_block", &label),
            &markup,
            |b, markup| {
                let eng = TextLayout::new(&palette, 1);
                let mut surface = Surface::new(width, 2048);
                b.iter(|| eng.render_block(&mut surface, markup, Rect::new(0, 0, width, 2048)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_measure, bench_render);
criterion_main!(benches);
