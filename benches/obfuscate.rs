use criterion::{black_box, criterion_group, criterion_main, Criterion};
use js_obfuscator::{obfuscate, Options, StringArrayEncoding};

const INPUT: &str = r#"
function fibonacci(n) {
    var a = 0, b = 1;
    for (var i = 0; i < n; i++) {
        var next = a + b;
        a = b;
        b = next;
    }
    return a;
}

function greet(user) {
    var greeting = 'Hello, ' + user.name + '!';
    var farewell = 'Goodbye, ' + user.name + '.';
    console.log(greeting);
    console.log('fibonacci(10) = ' + fibonacci(10));
    console.log(farewell);
    return { greeting: greeting, farewell: farewell };
}

greet({ name: 'world' });
"#;

fn bench_obfuscate(c: &mut Criterion) {
    let defaults = Options {
        seed: 1,
        ..Options::default()
    };
    c.bench_function("obfuscate_default", |b| {
        b.iter(|| obfuscate(black_box(INPUT), &defaults).expect("obfuscation failed"))
    });

    let everything = Options {
        seed: 1,
        string_array_threshold: 1.0,
        string_array_encoding: StringArrayEncoding::Rc4,
        split_strings: true,
        split_strings_chunk_length: 4,
        control_flow_flattening: true,
        control_flow_flattening_threshold: 1.0,
        dead_code_injection: true,
        unicode_escape_sequence: true,
        ..Options::default()
    };
    c.bench_function("obfuscate_everything", |b| {
        b.iter(|| obfuscate(black_box(INPUT), &everything).expect("obfuscation failed"))
    });
}

criterion_group!(benches, bench_obfuscate);
criterion_main!(benches);
