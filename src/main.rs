//! Headless demo: walk a few actors around a scene and grow it on demand
//!
//! Usage: `world_nav [scene.ron|scene.json] [config.ron]`

use std::env;

use world_nav::prelude::*;

const FRAME: f32 = 1.0 / 60.0;
const FRAMES: usize = 60 * 20;

fn demo_scene() -> SceneNode {
    SceneNode::new("town", NodeKind::World)
        .with_name("Town")
        .with_rect(0, 0, 20, 15)
        .with_child(
            SceneNode::new("plaza", NodeKind::Zone)
                .with_name("Plaza")
                .with_rect(2, 2, 8, 8)
                .with_child(
                    SceneNode::new("fountain", NodeKind::Object)
                        .with_rect(5, 5, 2, 2)
                        .with_walkable(false),
                ),
        )
        .with_child(
            SceneNode::new("library", NodeKind::Building)
                .with_name("Library")
                .with_rect(12, 2, 6, 6)
                .with_walkable(false)
                .with_child(
                    SceneNode::new("reading_room", NodeKind::Room)
                        .with_name("Reading Room")
                        .with_rect(13, 3, 4, 4)
                        .with_child(
                            SceneNode::new("shelf", NodeKind::Object)
                                .with_rect(13, 3, 4, 1)
                                .with_walkable(false),
                        ),
                ),
        )
}

/// Stand-in for the expansion transport: answers every request with an open
/// region planned from `bounds`, then grows `bounds` for the next answer
fn answer(
    bounds: &mut TileRect,
    size: u32,
    request: &ExpansionRequest,
    count: usize,
) -> ExpansionResponse {
    let plan = plan_expansion(*bounds, request.direction, size);
    *bounds = plan.root_bounds;
    let region = SceneNode::new(format!("region_{}_{count}", request.direction), NodeKind::Zone)
        .with_rect(plan.region.x, plan.region.y, plan.region.w, plan.region.h)
        .with_child(
            SceneNode::new(format!("boulder_{count}"), NodeKind::Object)
                .with_rect(plan.region.x + 1, plan.region.y + 1, 1, 1)
                .with_walkable(false),
        );
    ExpansionResponse::success(request.direction, region, plan.root_bounds)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let root = match args.next() {
        Some(path) => SceneNode::load(&path)?,
        None => demo_scene(),
    };
    let config = match args.next() {
        Some(path) => NavConfig::load_ron(&path)?,
        None => NavConfig::default(),
    };

    let mut world = NavWorld::new(root, config);
    world.spawn_player("player", TileCoord::new(10, 12))?;
    world.spawn_actor("maya", TileCoord::new(1, 1))?;
    world.spawn_actor("sam", TileCoord::new(8, 12))?;

    world.set_destination("player", TileCoord::new(18, 13))?;
    world.set_destination("maya", TileCoord::new(6, 6))?;
    if world.move_to_location("sam", "reading_room")?.is_none() {
        world.set_destination("sam", TileCoord::new(0, 0))?;
    }

    let mut answered = 0;
    for frame in 0..FRAMES {
        // Responses arrive one frame after their request
        let requests = world.drain_expansion_requests();
        world.tick(FRAME);
        let size = world.config().expansion.region_size;
        let mut bounds = world.grid().bounds();
        for request in &requests {
            answered += 1;
            let response = answer(&mut bounds, size, request, answered);
            world.receive_expansion(response);
        }

        for event in world.drain_events() {
            log::info!("[frame {frame}] {event:?}");
        }
    }

    for actor in world.snapshot() {
        println!(
            "{:>8} at {} ({:.1}, {:.1}){}",
            actor.id,
            actor.tile,
            actor.position.x,
            actor.position.y,
            if actor.walking { " walking" } else { "" }
        );
    }
    let stats = world.stats();
    println!(
        "bounds {}, {} searches ({} failed, {} substituted goals), {:.1} nodes/search, {} expansions",
        world.grid().bounds(),
        stats.searches,
        stats.failed_searches,
        stats.goal_substitutions,
        stats.average_nodes_expanded(),
        stats.expansions_applied
    );

    Ok(())
}
