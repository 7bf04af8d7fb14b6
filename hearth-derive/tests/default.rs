use hearth_derive::Component;

#[derive(Component)]
pub struct Pos(f32, f32, f32);

static_assertions::assert_impl_all!(Pos: hearth_ecs::component::Component);
static_assertions::const_assert_eq!(Pos::PAGE_SIZE, 1024);
static_assertions::const_assert!(!Pos::FIXED);

#[derive(Component)]
#[component(fixed)]
pub struct PlayerTag;

static_assertions::const_assert!(PlayerTag::FIXED);

#[derive(Component)]
#[component(page_size = 64)]
pub struct RareEffect;

static_assertions::const_assert_eq!(RareEffect::PAGE_SIZE, 64);

#[derive(Component)]
#[component(page_size = 32, fixed)]
pub struct ComboAttribute;

static_assertions::const_assert_eq!(ComboAttribute::PAGE_SIZE, 32);
static_assertions::const_assert!(ComboAttribute::FIXED);
