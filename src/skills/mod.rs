pub mod canonical;
pub mod repo_verify;
pub mod requirements;

pub use canonical::{
    aliases_for, canonical_token, content_tokens, normalize_skill, resilience_multiplier,
    text_mentions_skill,
};
pub use repo_verify::{RepoVerification, RepositorySkillVerifier};
pub use requirements::{ResolvedSkills, SkillRequirement, SkillRequirementResolver};
