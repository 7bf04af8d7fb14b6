//! Reflection dispatch end-to-end: registering a type with a constructor
//! and an attribute, then looking both back up through the registry.

use hearth_ecs::reflect::{reflect, registry, Any};

#[derive(Clone, PartialEq, Debug)]
struct Tag {
    v: i32,
}

#[derive(Clone, PartialEq, Debug)]
struct T {
    count: i32,
    label: String,
}

impl From<(i32, String)> for T {
    fn from(args: (i32, String)) -> T {
        T {
            count: args.0,
            label: args.1,
        }
    }
}

#[test]
fn s6_reflection_dispatch() {
    registry().reset();
    let info = reflect::<T>()
        .constructor::<(i32, String)>()
        .attribute(Tag { v: 42 })
        .register()
        .unwrap();

    let args = [Any::new(7i32), Any::new(String::from("x"))];
    let built = info.construct(&args).unwrap();
    assert_eq!(
        built.downcast_ref::<T>(),
        Some(&T {
            count: 7,
            label: "x".to_string(),
        })
    );

    let looked_up = registry().by_name(std::any::type_name::<T>()).unwrap();
    let tag = looked_up.get_attribute::<Tag>().unwrap();
    assert_eq!(tag.v, 42);
}

#[test]
fn s6_parent_chain_inheritance() {
    use hearth_ecs::reflect::Upcast;

    #[derive(Clone, PartialEq, Debug)]
    struct Base {
        id: i32,
    }

    #[derive(Clone, PartialEq, Debug)]
    struct Mid {
        base: Base,
    }

    #[derive(Clone, PartialEq, Debug)]
    struct Leaf {
        mid: Mid,
    }

    impl Upcast<Base> for Mid {
        fn upcast(&self) -> &Base {
            &self.base
        }
    }

    impl Upcast<Mid> for Leaf {
        fn upcast(&self) -> &Mid {
            &self.mid
        }
    }

    registry().reset();
    reflect::<Base>().register().unwrap();
    reflect::<Mid>().parent::<Base>().register().unwrap();
    let leaf_info = reflect::<Leaf>().parent::<Mid>().register().unwrap();

    assert!(leaf_info.inherits(std::any::type_name::<Mid>()), "Leaf's direct parent is Mid");
    assert!(
        leaf_info.inherits(std::any::type_name::<Base>()),
        "Leaf inherits Base transitively through Mid"
    );
    assert!(!leaf_info.inherits("not::a::real::Type"));

    let leaf = Leaf {
        mid: Mid {
            base: Base { id: 99 },
        },
    };
    let any = Any::new(leaf);
    let base: &Base = any.try_cast::<Base>().expect("Leaf inherits Base via Mid");
    assert_eq!(base.id, 99);

    let converted = any.convert::<Base>();
    assert_eq!(
        converted.downcast_ref::<Base>(),
        Some(&Base { id: 99 }),
        "any::convert performs the same two-hop parent upcast as try_cast, but returns an owned value"
    );
}

#[test]
fn s6_query_ranges_and_invoke() {
    #[derive(Clone, PartialEq, Debug)]
    struct Seconds(f64);

    #[derive(Clone, PartialEq, Debug)]
    struct Minutes(f64);

    impl From<Seconds> for Minutes {
        fn from(s: Seconds) -> Minutes {
            Minutes(s.0 / 60.0)
        }
    }

    fn double(s: &Seconds, _: ()) -> f64 {
        s.0 * 2.0
    }

    registry().reset();
    let info = reflect::<Seconds>()
        .convertible::<Minutes>()
        .constructor::<(f64,)>()
        .method::<(), f64>("double", double)
        .register()
        .unwrap();

    assert_eq!(info.parents().count(), 0);
    let conversions: Vec<_> = info.conversions().collect();
    assert_eq!(conversions.len(), 1);
    assert_eq!(conversions[0].name, std::any::type_name::<Minutes>());
    assert_eq!(info.constructors().count(), 1);
    assert_eq!(info.constructors().next().unwrap().arity, 1);

    assert!(info.convertible_to(std::any::type_name::<Minutes>()));
    assert!(!info.convertible_to("not::a::real::Type"));

    let value = Any::new(Seconds(90.0));
    let result = value.invoke("double", &[]).expect("double is registered with arity 0");
    assert_eq!(result.downcast_ref::<f64>(), Some(&180.0));

    assert!(value.invoke("missing", &[]).is_err());
}
