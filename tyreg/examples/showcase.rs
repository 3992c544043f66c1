//! A tour of the registry: describe a few types, then poke at values of them
//! without naming their Rust types.
//!
//! Run with `cargo run --example showcase -p tyreg`.

use tyreg::{TypeRegistry, prelude::*, text};

#[derive(Debug, Default)]
struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn scale(&mut self, factor: f32) {
        self.x *= factor;
        self.y *= factor;
    }
}

#[derive(Debug, Default)]
struct Sprite {
    name: String,
    position: Vec2,
    visible: bool,
    layer: u8,
}

fn distance(a: f32, b: f32) -> f32 {
    (a - b).abs()
}

fn main() {
    reflect::<Vec2>("Vec2")
        .property("x", field!(Vec2, x))
        .property("y", field!(Vec2, y))
        .function("length", Vec2::length)
        .function("scale", Vec2::scale)
        .constructor();
    reflect::<Sprite>("Sprite")
        .property("name", field!(Sprite, name))
        .property("position", field!(Sprite, position))
        .property("visible", field!(Sprite, visible))
        .property("layer", field!(Sprite, layer))
        .constructor();
    reflect_fn("distance", distance);

    println!("== registered types ==");
    for (name, meta) in TypeRegistry::global().names() {
        println!("{name:>8}: {} bytes, {:?}", meta.size(), meta.kind());
    }

    let mut sprite = Sprite {
        name: "player one".into(),
        position: Vec2 { x: 3.0, y: 4.0 },
        visible: true,
        layer: 2,
    };
    let mut var = VarPtr::new(&mut sprite);

    println!("\n== properties of {} ==", var.type_info());
    for property in var.type_info().properties() {
        println!(
            "{:>10} @ {:>2}: {}",
            property.name(),
            property.offset(),
            property.element_type()
        );
    }

    println!("\n== calling members by name ==");
    let mut position = var.property_mut("position").unwrap();
    let mut length = 0f32;
    position.call_method("length", &mut VarPtr::new(&mut length), &mut []);
    println!("length before: {length}");
    let mut factor = 2f32;
    position.call_method(
        "scale",
        &mut VarPtr::default(),
        &mut [VarPtr::new(&mut factor)],
    );
    position.call_method("length", &mut VarPtr::new(&mut length), &mut []);
    println!("length after:  {length}");

    println!("\n== free functions ==");
    let distance = function_named("distance").unwrap();
    let (mut a, mut b, mut out) = (1.5f32, 4.0f32, 0f32);
    distance.invoke(
        &mut VarPtr::new(&mut out),
        &mut [VarPtr::new(&mut a), VarPtr::new(&mut b)],
    );
    println!("distance(1.5, 4.0) = {out}");

    println!("\n== text format ==");
    let written = var.to_string();
    print!("{written}");

    match text::from_str_dynamic(&written) {
        Ok(copy) => println!("\nread back as a fresh `{}`:\n{copy}", copy.type_info()),
        Err(err) => eprintln!("could not read it back: {err}"),
    }
}
