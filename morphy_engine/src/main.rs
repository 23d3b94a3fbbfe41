extern crate morphy_engine;

use morphy_engine::engine::MorphyEngine;

fn main() {
    let mut engine = MorphyEngine::init(true);
    engine.uci();
}
