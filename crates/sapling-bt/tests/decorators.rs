use sapling_bt::{Builder, Node, Status, SubStatus, Tree, TreeConfig, Variable};

#[derive(Debug, Default)]
struct RecordingWorld {
    log: Vec<String>,
    guard: bool,
    finish: bool,
    attempts: u32,
    seen: Vec<i32>,
}

impl RecordingWorld {
    fn push(&mut self, entry: String) {
        self.log.push(entry);
    }

    fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|e| *e == entry).count()
    }
}

fn recorded(b: &mut Builder<RecordingWorld>, name: &'static str, result: Status) -> Node<RecordingWorld> {
    b.leaf(name, move |s| {
        s.on_enabled(move |cx| cx.world.push(format!("{name} enabled")))
            .on_enter(move |cx| cx.world.push(format!("{name} enter")))
            .on_exit(move |cx| cx.world.push(format!("{name} exit")))
            .on_disabled(move |cx| cx.world.push(format!("{name} disabled")))
            .on_base_tick(move |_| result);
    })
}

#[test]
fn false_condition_fails_without_entering_the_child() {
    let mut b = Builder::<RecordingWorld>::new();
    b.condition(|cx| cx.world.guard);
    let root = recorded(&mut b, "guarded", Status::Success);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(tree.root().kind(), "Condition");
    assert_eq!(world.count("guarded enter"), 0);
    assert_eq!(tree.root().children()[0].sub_status(), SubStatus::None);
}

#[test]
fn condition_winds_the_child_down_when_it_stops_holding() {
    let mut b = Builder::<RecordingWorld>::new();
    b.condition(|cx| cx.world.guard);
    let root = recorded(&mut b, "guarded", Status::Running);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld {
        guard: true,
        ..Default::default()
    };

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(world.count("guarded enter"), 1);

    world.guard = false;
    assert_eq!(tree.tick(&mut world), Status::Failure);
    assert_eq!(world.count("guarded exit"), 1);
    assert_eq!(world.count("guarded disabled"), 1);
}

#[test]
fn condition_latch_ignores_the_guard_while_the_child_runs() {
    let mut b = Builder::<RecordingWorld>::new();
    b.condition_latch(|cx| cx.world.guard);
    let root = b.leaf("latched", |s| {
        s.on_exit(|cx| cx.world.push("latched exit".into()))
            .on_base_tick(|cx| {
                if cx.world.finish {
                    Status::Success
                } else {
                    Status::Running
                }
            });
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld {
        guard: true,
        ..Default::default()
    };

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.root().kind(), "ConditionLatch");

    world.guard = false;
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(world.count("latched exit"), 0);

    world.finish = true;
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("latched exit"), 1);
}

#[test]
fn invert_swaps_terminal_results() {
    for (result, expected) in [
        (Status::Success, Status::Failure),
        (Status::Failure, Status::Success),
        (Status::Running, Status::Running),
    ] {
        let mut b = Builder::<RecordingWorld>::new();
        b.invert();
        let root = recorded(&mut b, "inner", result);
        let mut tree = Tree::new(b.finish(root).expect("valid tree"));
        assert_eq!(tree.tick(&mut RecordingWorld::default()), expected);
    }
}

#[test]
fn always_succeed_masks_failure_only() {
    for (result, expected) in [
        (Status::Failure, Status::Success),
        (Status::Success, Status::Success),
        (Status::Running, Status::Running),
    ] {
        let mut b = Builder::<RecordingWorld>::new();
        b.always_succeed();
        let root = recorded(&mut b, "inner", result);
        let mut tree = Tree::new(b.finish(root).expect("valid tree"));
        assert_eq!(tree.tick(&mut RecordingWorld::default()), expected);
    }
}

#[test]
fn first_pushed_decorator_is_outermost() {
    let mut b = Builder::<RecordingWorld>::new();
    b.invert().always_succeed();
    let root = recorded(&mut b, "inner", Status::Failure);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));

    // Invert(AlwaysSucceed(Failure)) = Failure; the other nesting would give Success.
    assert_eq!(tree.tick(&mut RecordingWorld::default()), Status::Failure);
    assert_eq!(tree.root().kind(), "Invert");
    assert_eq!(tree.root().children()[0].kind(), "AlwaysSucceed");
    assert_eq!(tree.root().children()[0].children()[0].name(), "inner");
}

#[test]
fn repeat_count_reenters_the_child_once_per_step() {
    let mut b = Builder::<RecordingWorld>::new();
    b.repeat_count(3);
    let root = recorded(&mut b, "again", Status::Success);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("again enabled"), 1);
    assert_eq!(world.count("again enter"), 3);
}

#[test]
fn repeat_count_zero_succeeds_immediately() {
    let mut b = Builder::<RecordingWorld>::new();
    b.repeat_count(0);
    let root = recorded(&mut b, "never", Status::Success);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("never enter"), 0);
}

#[test]
fn unbounded_repeat_keeps_running() {
    let mut b = Builder::<RecordingWorld>::new();
    b.repeat();
    let root = recorded(&mut b, "forever", Status::Failure);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    for _ in 0..5 {
        assert_eq!(tree.tick(&mut world), Status::Running);
    }
    assert_eq!(world.count("forever enter"), 5);
}

#[test]
fn until_retries_until_the_target_status() {
    let mut b = Builder::<RecordingWorld>::new();
    b.until(Status::Success);
    let root = b.leaf("flaky", |s| {
        s.on_base_tick(|cx| {
            cx.world.attempts += 1;
            if cx.world.attempts >= 3 {
                Status::Success
            } else {
                Status::Failure
            }
        });
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.attempts, 3);
}

#[test]
fn for_each_runs_the_child_once_per_item() {
    let item = Variable::new("item", 0i32);

    let mut b = Builder::<RecordingWorld>::new();
    b.for_each(|_| vec![1, 2, 3], item.clone());
    let current = item.clone();
    let root = b.leaf("visit", move |s| {
        s.on_base_tick(move |cx| {
            cx.world.seen.push(current.get());
            Status::Success
        });
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.seen, [1, 2, 3]);
    assert_eq!(item.get(), 3);
}

#[test]
fn for_each_over_nothing_succeeds_without_ticking_the_child() {
    let item = Variable::new("item", 0i32);

    let mut b = Builder::<RecordingWorld>::new();
    b.for_each(|_| Vec::new(), item);
    let root = recorded(&mut b, "visit", Status::Success);
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("visit enter"), 0);
}

#[test]
fn while_leaves_the_child_until_the_predicate_holds_again() {
    let mut b = Builder::<RecordingWorld>::new();
    b.while_holds(|cx| cx.world.guard);
    let root = recorded(&mut b, "patrol", Status::Running);
    let config = TreeConfig::default().with_restart_on_complete(true);
    let mut tree = Tree::with_config(b.finish(root).expect("valid tree"), config);
    let mut world = RecordingWorld {
        guard: true,
        ..Default::default()
    };

    assert_eq!(tree.tick(&mut world), Status::Running);

    world.guard = false;
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(tree.root().children()[0].sub_status(), SubStatus::Running);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(world.count("patrol exit"), 0);

    world.guard = true;
    assert_eq!(tree.tick(&mut world), Status::Running);
    assert_eq!(world.count("patrol disabled"), 1);
    assert_eq!(world.count("patrol enabled"), 2);
}

#[test]
fn reset_decorator_starts_a_fresh_activation_each_time() {
    let mut b = Builder::<RecordingWorld>::new();
    b.reset();
    let root = recorded(&mut b, "fresh", Status::Success);
    let config = TreeConfig::default().with_restart_on_complete(true);
    let mut tree = Tree::with_config(b.finish(root).expect("valid tree"), config);
    let mut world = RecordingWorld::default();

    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(tree.tick(&mut world), Status::Success);
    assert_eq!(tree.root().kind(), "Reset");
    assert_eq!(world.count("fresh enabled"), 2);
    assert_eq!(world.count("fresh disabled"), 1);
}

#[test]
fn decorators_left_without_a_node_are_reported() {
    let mut b = Builder::<RecordingWorld>::new();
    let root = b.sequence("root", |b| {
        let only = recorded(b, "only", Status::Success);
        b.invert();
        vec![only]
    });
    let err = b.finish(root).expect_err("dangling decorator");
    assert!(err.to_string().contains("root"));
}
