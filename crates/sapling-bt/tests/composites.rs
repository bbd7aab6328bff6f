use sapling_bt::{Builder, Node, ParallelPolicy, Status, SubStatus, Tree};

#[derive(Debug, Default)]
struct RecordingWorld {
    log: Vec<String>,
}

impl RecordingWorld {
    fn push(&mut self, entry: String) {
        self.log.push(entry);
    }

    fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|e| *e == entry).count()
    }
}

/// Leaf that reports `result` from tick `at` on, `Running` before that.
fn resolves_at(
    b: &mut Builder<RecordingWorld>,
    name: &'static str,
    at: u64,
    result: Status,
) -> Node<RecordingWorld> {
    b.leaf(name, move |s| {
        s.on_enter(move |cx| cx.world.push(format!("{name} enter")))
            .on_exit(move |cx| cx.world.push(format!("{name} exit")))
            .on_success(move |cx| cx.world.push(format!("{name} success")))
            .on_disabled(move |cx| cx.world.push(format!("{name} disabled")))
            .on_base_tick(move |cx| {
                if cx.tick.tick >= at {
                    result
                } else {
                    Status::Running
                }
            });
    })
}

#[test]
fn sequence_fails_on_the_tick_its_third_child_fails() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence("seq", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Success),
            resolves_at(b, "b", 2, Status::Success),
            resolves_at(b, "c", 3, Status::Failure),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Failure);

    assert_eq!(world.count("a enter"), 1);
    assert_eq!(world.count("b enter"), 1);
    assert_eq!(world.count("c enter"), 1);
    assert_eq!(world.count("c exit"), 1);

    let children = tree.root().children();
    assert!(children.iter().all(Node::is_done));
    assert_eq!(children[2].status(), Status::Failure);
}

#[test]
fn sequence_leaves_later_children_untouched_after_failure() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence("seq", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Failure),
            resolves_at(b, "b", 1, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(tree.root().children()[1].sub_status(), SubStatus::None);
    assert_eq!(world.count("b enter"), 0);
}

#[test]
fn sequence_always_runs_every_child_in_one_pass() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence_always("all", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Success),
            resolves_at(b, "b", 1, Status::Failure),
            resolves_at(b, "c", 1, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(world.count("a success"), 1);
    assert_eq!(world.count("c success"), 1);
    assert_eq!(world.count("b success"), 0);
}

#[test]
fn sequence_always_holds_the_pass_at_a_running_child() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence_always("all", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Failure),
            resolves_at(b, "b", 2, Status::Success),
            resolves_at(b, "c", 1, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(world.count("c enter"), 0);
    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(world.count("c success"), 1);
}

#[test]
fn selector_short_circuits_on_first_success() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.selector("pick", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Failure),
            resolves_at(b, "b", 2, Status::Success),
            resolves_at(b, "c", 1, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("c enter"), 0);
}

#[test]
fn selector_fails_when_every_child_fails() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.selector("pick", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Failure),
            resolves_at(b, "b", 1, Status::Failure),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Failure);
}

#[test]
fn parallel_waits_for_every_child_then_applies_policy() {
    for (policy, expected) in [
        (ParallelPolicy::RequireAll, Status::Failure),
        (ParallelPolicy::RequireOne, Status::Success),
    ] {
        let mut b = Builder::<RecordingWorld>::new();
        let root = b.parallel("both", policy, |b| {
            vec![
                resolves_at(b, "fast", 1, Status::Success),
                resolves_at(b, "slow", 2, Status::Failure),
            ]
        });
        let mut tree = Tree::new(b.finish(root).expect("valid tree"));
        let mut world = RecordingWorld::default();

        assert_eq!(tree.tick(&mut world), Status::Running);
        assert!(tree.root().children()[0].is_done());
        assert_eq!(tree.tick(&mut world), expected);
        assert_eq!(world.count("fast enter"), 1);
    }
}

#[test]
fn race_resets_the_loser_before_reporting_the_winner() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.race("race", |b| {
        vec![
            resolves_at(b, "slow", 10, Status::Failure),
            resolves_at(b, "fast", 2, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);

    let children = tree.root().children();
    assert_eq!(children[0].sub_status(), SubStatus::None);
    assert_eq!(children[1].status(), Status::Success);
    assert_eq!(world.count("slow exit"), 1);
    assert_eq!(world.count("slow disabled"), 1);

    let slow_disabled = world
        .log
        .iter()
        .position(|e| e == "slow disabled")
        .expect("loser disabled");
    let fast_success = world
        .log
        .iter()
        .position(|e| e == "fast success")
        .expect("winner succeeded");
    assert!(fast_success < slow_disabled);
}

#[test]
fn graceful_reset_of_a_composite_releases_every_scope() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence("seq", |b| {
        vec![
            resolves_at(b, "a", 1, Status::Success),
            resolves_at(b, "b", 1, Status::Success),
            resolves_at(b, "c", 5, Status::Success),
        ]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    tree.tick(&mut world);
    assert_eq!(tree.scopes().stats().outstanding(), 4);

    assert!(tree.reset_gracefully(&mut world));
    let stats = tree.scopes().stats();
    assert!(stats.is_balanced());
    assert_eq!(stats.recycled, 4);
    assert_eq!(stats.disposed, 0);
    assert!(tree.root().children().iter().all(|c| c.sub_status() == SubStatus::None));
}

#[test]
fn race_ticks_every_child_on_the_deciding_step() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.race("race", |b| {
        let later = b.leaf("later", |s| {
            s.on_pre_tick(|cx| cx.world.push("later tick".into()))
                .on_disabled(|cx| cx.world.push("later disabled".into()))
                .on_base_tick(|_| Status::Running);
        });
        vec![resolves_at(b, "first", 1, Status::Failure), later]
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(world.count("later tick"), 1);
    assert_eq!(world.count("later disabled"), 1);
    assert_eq!(tree.root().children()[1].sub_status(), SubStatus::None);
}
