use crate::scope::Scope;

pub fn begin_transaction(scope: &mut Scope<'_>) {
    scope.begin();
}

pub fn commit_or_rollback_transaction(scope: &mut Scope<'_>) {
    scope.commit_or_rollback();
}
