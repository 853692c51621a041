/// Projector compilation: one conversion routine per shape
///
/// Matching, compatibility checks and reader selection all happen here, once.
/// The resulting `Projector` only walks a precomputed step list per row:
/// null check, native read, optional conversion, assignment.
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{ProjectionError, ProjectionResult};
use crate::mapping::compat::{convert, is_compatible, needs_conversion};
use crate::mapping::matcher::{match_destination, MappingPlan, MatchOptions};
use crate::metadata::column::TypeTag;
use crate::metadata::member::{Member, MemberDef, Projectable, TargetKind, TypeDescriptor};
use crate::metadata::shape::Shape;
use crate::row::accessor::{reader_for, Reader, RowAccessor};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type ProjectFn<T> = dyn Fn(&dyn RowAccessor) -> ProjectionResult<T> + Send + Sync;

/// Compiled, immutable row → `T` conversion. Cheap to clone, safe to share.
pub struct Projector<T> {
    project: Arc<ProjectFn<T>>,
    plan: Arc<MappingPlan>,
}

impl<T> Clone for Projector<T> {
    fn clone(&self) -> Self {
        Projector {
            project: Arc::clone(&self.project),
            plan: Arc::clone(&self.plan),
        }
    }
}

impl<T> fmt::Debug for Projector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("target", &std::any::type_name::<T>())
            .field("plan", &self.plan)
            .finish()
    }
}

impl<T> Projector<T> {
    /// Convert one row
    pub fn project(&self, row: &dyn RowAccessor) -> ProjectionResult<T> {
        (self.project)(row)
    }

    /// Member/column pairs this projector assigns (empty for scalar targets)
    pub fn plan(&self) -> &MappingPlan {
        &self.plan
    }
}

/// One member assignment
struct Step<T> {
    ordinal: usize,
    reader: Reader,
    convert_to: Option<TypeTag>,
    member: MemberDef<T>,
}

impl<T> Step<T> {
    fn apply(&self, row: &dyn RowAccessor, target: &mut T) -> ProjectionResult<()> {
        let value = if row.is_null(self.ordinal) {
            Value::Null
        } else {
            let native = (self.reader)(row, self.ordinal)?;
            match self.convert_to {
                Some(tag) => convert(native, tag)?,
                None => native,
            }
        };
        self.member.assign(target, value)
    }
}

/// Build the projector for `shape` from `T`'s descriptor
pub fn compile<T: Projectable>(
    shape: &Shape,
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> ProjectionResult<Projector<T>> {
    compile_descriptor(T::descriptor(), shape, options, sink)
}

/// Same as `compile`, for an explicit descriptor
pub fn compile_descriptor<T: 'static>(
    descriptor: TypeDescriptor<T>,
    shape: &Shape,
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> ProjectionResult<Projector<T>> {
    let name = descriptor.name();
    match descriptor.kind() {
        TargetKind::Scalar { type_tag, convert } => {
            Ok(compile_scalar(name, *type_tag, *convert, shape, options, sink))
        }
        TargetKind::Composite { constructor, members } => {
            let constructor = (*constructor).ok_or_else(|| ProjectionError::missing_constructor(name))?;
            Ok(compile_composite(name, constructor, members, shape, options, sink))
        }
    }
}

fn compile_scalar<T: 'static>(
    name: &str,
    type_tag: TypeTag,
    from_value: fn(Value) -> ProjectionResult<T>,
    shape: &Shape,
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> Projector<T> {
    let first = shape.columns().first();
    let usable = first.filter(|c| is_compatible(c.type_tag, type_tag));

    let project: Arc<ProjectFn<T>> = match usable {
        Some(column) => {
            let reader = reader_for(column.type_tag.kind);
            let convert_to = needs_conversion(column.type_tag, type_tag).then_some(type_tag);
            Arc::new(move |row: &dyn RowAccessor| {
                if row.is_null(0) {
                    return from_value(Value::Null);
                }
                let native = reader(row, 0)?;
                match convert_to {
                    Some(tag) => from_value(convert(native, tag)?),
                    None => from_value(native),
                }
            })
        }
        None => {
            if options.report_unmapped_members {
                sink.emit(&Diagnostic {
                    kind: DiagnosticKind::UnmappedMember,
                    target: name.to_string(),
                    name: name.to_string(),
                    type_tag,
                    prefix: None,
                    incompatible_with: first.map(|c| c.name.clone()),
                });
            }
            // Best effort: every row yields the zero value
            Arc::new(move |_row: &dyn RowAccessor| from_value(Value::Null))
        }
    };

    Projector {
        project,
        plan: Arc::new(MappingPlan::default()),
    }
}

fn compile_composite<T: 'static>(
    name: &str,
    constructor: fn() -> T,
    members: &[MemberDef<T>],
    shape: &Shape,
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> Projector<T> {
    let member_list: Vec<Member> = members.iter().map(|m| m.member().clone()).collect();
    let plan = match_destination(name, shape.columns(), &member_list, options, sink);

    let steps: Vec<Step<T>> = plan
        .pairs()
        .iter()
        .map(|pair| {
            let column = &shape.columns()[pair.column];
            let member = &members[pair.member];
            Step {
                ordinal: column.ordinal,
                reader: reader_for(column.type_tag.kind),
                convert_to: needs_conversion(column.type_tag, member.type_tag())
                    .then_some(member.type_tag()),
                member: member.clone(),
            }
        })
        .collect();

    let project: Arc<ProjectFn<T>> = Arc::new(move |row: &dyn RowAccessor| {
        let mut target = constructor();
        for step in &steps {
            step.apply(row, &mut target)?;
        }
        Ok(target)
    });

    Projector {
        project,
        plan: Arc::new(plan),
    }
}
