//! Typed accessors for statically declared structs.

/// Declares a struct schema with scalar members and generates a typed view for it.
///
/// Each member is a [crate::Scalar] type at a fixed byte offset; `size` and `align` give the
/// struct's layout. The macro generates:
///
/// - A unit descriptor `Name` implementing [crate::Descriptor], with `Name::schema()`,
///   `Name::bind(buf, offset)` and `Name::create(builder, members...)`.
/// - A view `NameView<'t, B>` with a getter and a `set_` method per member.
///
/// # Panics
///
/// The first call to `Name::schema()` panics if the declared members do not fit the layout
/// (overlapping, misaligned, or out of range).
///
/// # Example
///
/// ```rust
/// use lattice_view::{structure, MessageBuilder};
///
/// structure! {
///     /// A point in space.
///     pub struct Vec3(size = 12, align = 4) {
///         x: f32 = 0,
///         y: f32 = 4,
///         z: f32 = 8,
///     }
/// }
///
/// let mut builder = MessageBuilder::default();
/// let mut point = Vec3::create(&mut builder, 42.0, 50.0, 512.0).unwrap();
/// point.set_y(1.5).unwrap();
/// assert_eq!(point.y().unwrap(), 1.5);
/// assert_eq!(point.z().unwrap(), 512.0);
/// ```
#[macro_export]
macro_rules! structure {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident(size = $size:expr, align = $align:expr) {
            $($member:ident: $ty:ty = $offset:expr),+ $(,)?
        }
    ) => {
        $crate::paste::paste! {
            $(#[$attr])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            $vis struct $name;

            impl $name {
                /// The shared descriptor for this struct.
                pub fn schema() -> &'static $crate::Type {
                    static SCHEMA: ::std::sync::OnceLock<$crate::Type> = ::std::sync::OnceLock::new();
                    SCHEMA.get_or_init(|| {
                        let members = [$(
                            $crate::Member::new(
                                stringify!($member),
                                $crate::Type::Primitive(<$ty as $crate::Scalar>::PRIMITIVE),
                                $offset,
                            )
                        ),+];
                        let layout = $crate::Layout::new($size, $align);
                        match $crate::StructType::new(stringify!($name), layout, members) {
                            Ok(schema) => $crate::Type::Struct(::std::sync::Arc::new(schema)),
                            Err(err) => panic!("{err}"),
                        }
                    })
                }

                /// Binds an existing value at absolute `offset` of `buf`.
                pub fn bind<B: AsRef<[u8]>>(
                    buf: B,
                    offset: usize,
                ) -> Result<[<$name View>]<'static, B>, $crate::Error> {
                    let view = Self::schema().bind(buf, offset)?;
                    Ok([<$name View>](view.into_struct()?))
                }

                /// Allocates and initializes a value in `builder`.
                #[allow(clippy::too_many_arguments)]
                pub fn create(
                    builder: &mut $crate::MessageBuilder,
                    $($member: $ty),+
                ) -> Result<[<$name View>]<'static, &mut [u8]>, $crate::Error> {
                    let value = $crate::Value::structure([$(
                        (stringify!($member), ::core::convert::Into::<$crate::Value>::into($member))
                    ),+]);
                    let view = builder.create(Self::schema(), &value)?;
                    Ok([<$name View>](view.into_struct()?))
                }
            }

            impl $crate::Descriptor for $name {
                type View<'t, B> = [<$name View>]<'t, B> where Self: 't;

                fn descriptor(&self) -> &$crate::Type {
                    Self::schema()
                }

                fn narrow<'t, B>(
                    &'t self,
                    view: $crate::View<'t, B>,
                ) -> Result<Self::View<'t, B>, $crate::Error> {
                    Ok([<$name View>](view.into_struct()?))
                }
            }

            #[doc = concat!("A bound [", stringify!($name), "].")]
            #[derive(Debug)]
            $vis struct [<$name View>]<'t, B>($crate::StructView<'t, B>);

            impl<'t, B> [<$name View>]<'t, B> {
                pub fn as_struct(&self) -> &$crate::StructView<'t, B> {
                    &self.0
                }

                pub fn into_struct(self) -> $crate::StructView<'t, B> {
                    self.0
                }

                /// Where this value lives, for initializing pointers to it.
                pub fn target(&self) -> $crate::Target {
                    $crate::Target {
                        offset: self.0.region().offset(),
                        layout: $crate::Layout::new($size, $align),
                    }
                }
            }

            impl<'t, B: AsRef<[u8]>> [<$name View>]<'t, B> {
                $(
                    #[doc = concat!("Reads `", stringify!($member), "`.")]
                    pub fn $member(&self) -> Result<$ty, $crate::Error> {
                        self.0.get::<$ty>(stringify!($member))
                    }
                )+

                pub fn value(&self) -> Result<$crate::Value, $crate::Error> {
                    self.0.value()
                }
            }

            impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> [<$name View>]<'t, B> {
                $(
                    #[doc = concat!("Writes `", stringify!($member), "`.")]
                    pub fn [<set_ $member>](&mut self, value: $ty) -> Result<(), $crate::Error> {
                        self.0.set::<$ty>(stringify!($member), value)
                    }
                )+
            }
        }
    };
}
