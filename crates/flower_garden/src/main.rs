use bevy::app::AppExit;

fn main() -> AppExit {
    flower_garden::run()
}
