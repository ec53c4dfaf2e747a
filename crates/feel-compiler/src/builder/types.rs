//! Type reference resolution

use crate::context::TranslationContext;
use feel_core::FType;
use feel_parser::TypeRef;

/// Resolve a written type reference, `None` if a named type is unknown
pub fn resolve_type(ctx: &TranslationContext, type_ref: &TypeRef) -> Option<FType> {
    let resolved = match type_ref {
        TypeRef::Named(name) => ctx.type_by_name(name)?,
        TypeRef::List(element) => FType::list(resolve_type(ctx, element)?),
        TypeRef::Context(fields) => {
            let fields = fields
                .iter()
                .map(|(name, t)| Some((name.clone(), resolve_type(ctx, t)?)))
                .collect::<Option<Vec<_>>>()?;
            FType::Context(fields)
        }
        TypeRef::Range {
            element,
            start_inclusive,
            end_inclusive,
        } => FType::Range {
            element: Box::new(resolve_type(ctx, element)?),
            start_inclusive: *start_inclusive,
            end_inclusive: *end_inclusive,
        },
        TypeRef::Function { params, ret } => {
            let params = params
                .iter()
                .map(|p| resolve_type(ctx, p))
                .collect::<Option<Vec<_>>>()?;
            FType::anonymous_function(params, resolve_type(ctx, ret)?)
        }
    };
    Some(resolved)
}

/// First unresolvable name in a type reference
pub fn unknown_name<'t>(ctx: &TranslationContext, type_ref: &'t TypeRef) -> Option<&'t str> {
    match type_ref {
        TypeRef::Named(name) => ctx.type_by_name(name).is_none().then_some(name.as_str()),
        TypeRef::List(element) | TypeRef::Range { element, .. } => unknown_name(ctx, element),
        TypeRef::Context(fields) => fields.iter().find_map(|(_, t)| unknown_name(ctx, t)),
        TypeRef::Function { params, ret } => params
            .iter()
            .chain(std::iter::once(&**ret))
            .find_map(|t| unknown_name(ctx, t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::infix::test_support::context;

    #[test]
    fn test_resolve_nested() {
        let ctx = context();
        let type_ref = TypeRef::List(Box::new(TypeRef::Context(vec![
            ("name".to_string(), TypeRef::Named("string".to_string())),
            ("born".to_string(), TypeRef::Named("date and time".to_string())),
        ])));
        assert_eq!(
            resolve_type(&ctx, &type_ref),
            Some(FType::list(FType::context(vec![
                ("name", FType::String),
                ("born", FType::DateTime)
            ])))
        );
    }

    #[test]
    fn test_unknown_name() {
        let ctx = context();
        let type_ref = TypeRef::Function {
            params: vec![TypeRef::Named("number".to_string())],
            ret: Box::new(TypeRef::Named("money".to_string())),
        };
        assert!(resolve_type(&ctx, &type_ref).is_none());
        assert_eq!(unknown_name(&ctx, &type_ref), Some("money"));
    }
}
