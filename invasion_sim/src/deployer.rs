use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::graph::City;
use crate::world::World;

/// Result of one sweep over the reserve.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeployPass {
    pub deployed: u32,
    /// Nothing left to do: reserve empty, map empty, or simulation finished.
    pub done: bool,
}

/// Lands reserve aliens in any city with a free slot as space opens up.
pub struct ReserveDeployer {
    world: Arc<World>,
    events: Sender<String>,
    idle: Duration,
}

impl ReserveDeployer {
    pub fn new(world: Arc<World>, events: Sender<String>, idle: Duration) -> Self {
        Self {
            world,
            events,
            idle,
        }
    }

    /// Keep deploying until the reserve or the map runs out, or the driver
    /// has finished. Returns the number of aliens deployed.
    pub fn run(mut self) -> u32 {
        let mut total = 0;
        loop {
            let pass = self.deploy_pass();
            total += pass.deployed;
            if pass.done {
                break;
            }
            if pass.deployed == 0 {
                thread::sleep(self.idle);
            }
        }
        info!(target: "invasion::deployer", deployed = total, "deployer.stopped");
        total
    }

    /// Place as many reserve aliens as there are open slots. Cities filled by
    /// a landing are enqueued for destruction once the lock is released.
    pub fn deploy_pass(&mut self) -> DeployPass {
        let mut filled = Vec::new();
        let mut deployed = 0;
        {
            let mut guard = self.world.lock();
            let state = &mut *guard;
            if state.is_finished() || state.roster.reserve_len() == 0 || state.graph.is_empty() {
                return DeployPass {
                    deployed: 0,
                    done: true,
                };
            }

            for id in state.roster.reserve_ids() {
                let Some(city) = state.graph.first_open_city().map(str::to_string) else {
                    break;
                };
                if !state.invade(&city, id) {
                    break;
                }
                if let Err(err) = state.roster.deploy(id) {
                    warn!(target: "invasion::deployer", alien = %id, error = %err, "alien.deploy_failed");
                    continue;
                }
                state.metrics.deployed += 1;
                deployed += 1;
                debug!(target: "invasion::deployer", alien = %id, city = %city, "alien.deployed");

                if state.graph.get(&city).is_some_and(City::is_full) {
                    state.metrics.events_enqueued += 1;
                    filled.push(city);
                }
            }
        }

        for city in filled {
            if self.events.send(city).is_err() {
                return DeployPass {
                    deployed,
                    done: true,
                };
            }
        }
        DeployPass {
            deployed,
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_file::parse_map;
    use crate::roster::{Alien, AlienId, AlienRoster, Population};
    use crate::world::WorldState;

    fn world(map: &str, placed: &[(u32, &str)], reserve: &[u32]) -> Arc<World> {
        let mut graph = parse_map(map);
        let mut roster = AlienRoster::new();
        for &(id, city) in placed {
            let mut alien = Alien::new(AlienId(id));
            assert!(graph.invade(city, &mut alien));
            roster.enlist(alien);
        }
        for &id in reserve {
            roster.enlist(Alien::new(AlienId(id)));
        }
        Arc::new(World::new(WorldState::new(graph, roster)))
    }

    #[test]
    fn fills_open_cities_in_name_order() {
        let world = world("A north=B\nB south=A\n", &[(1, "A"), (2, "A")], &[3, 4]);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut deployer = ReserveDeployer::new(Arc::clone(&world), sender, Duration::ZERO);

        let pass = deployer.deploy_pass();
        assert_eq!(pass.deployed, 2);
        assert!(!pass.done);
        assert_eq!(receiver.try_recv().as_deref(), Ok("B"));

        let state = world.lock();
        assert_eq!(state.roster.population_of(AlienId(3)), Some(Population::Active));
        assert_eq!(state.roster.population_of(AlienId(4)), Some(Population::Active));
        assert!(state.graph.get("B").unwrap().is_full());
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn waits_while_every_city_is_full() {
        let world = world("A north=B\n", &[(1, "A"), (2, "A")], &[3]);
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let mut deployer = ReserveDeployer::new(Arc::clone(&world), sender, Duration::ZERO);

        assert_eq!(
            deployer.deploy_pass(),
            DeployPass {
                deployed: 0,
                done: false
            }
        );
        assert_eq!(world.lock().roster.reserve_len(), 1);
    }

    #[test]
    fn stops_once_finished() {
        let world = world("A north=B\n", &[(1, "A"), (2, "A")], &[3]);
        world.lock().mark_finished();
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let deployer = ReserveDeployer::new(Arc::clone(&world), sender, Duration::ZERO);
        assert_eq!(deployer.run(), 0);
    }

    #[test]
    fn stops_when_reserve_is_empty() {
        let world = world("A north=B\n", &[], &[1]);
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let deployer = ReserveDeployer::new(Arc::clone(&world), sender, Duration::ZERO);
        assert_eq!(deployer.run(), 1);
        assert_eq!(world.lock().graph.get("A").unwrap().occupants(), [None, Some(AlienId(1))]);
    }
}
