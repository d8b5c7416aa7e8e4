use anyhow::Result;

pub trait Request {
    type Resp;
}

pub trait Queryable<Req>
where
    Req: Request,
{
    fn query(&self, req: Req) -> Result<Req::Resp>;
}

/// Commands mutate, so they need the single owner of whatever they act on.
pub trait Commandable<Req>
where
    Req: Request,
{
    fn execute(&mut self, req: Req) -> Result<Req::Resp>;
}
